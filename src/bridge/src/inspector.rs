//! Classification of the transfer call's argument shape.

use crate::ledger::CallMetadata;
use primitives::{CallSignature, SignatureVariant};

/// Markers of a 20-byte execution address in names or type descriptors.
const ADDRESS_MARKERS: &[&str] = &["h160", "h-160"];

/// Markers of a native account id.
const ACCOUNT_ID_MARKERS: &[&str] = &["accountid"];

/// Classifies the transfer call from its declared arguments.
///
/// Pure: the classification only looks at the argument count and at marker
/// substrings (case-insensitive) in either the names or the type descriptors.
pub fn resolve(metadata: &CallMetadata) -> CallSignature {
    let arg_names: Vec<String> = metadata.args.iter().map(|a| a.name.clone()).collect();
    let arg_type_hints: Vec<String> = metadata.args.iter().map(|a| a.type_name.clone()).collect();

    let names = arg_names.join(",").to_lowercase();
    let types = arg_type_hints.join(",").to_lowercase();
    let has = |markers: &[&str]| {
        markers
            .iter()
            .any(|m| names.contains(m) || types.contains(m))
    };
    let has_address = has(ADDRESS_MARKERS);
    let has_account_id = has(ACCOUNT_ID_MARKERS);

    let variant = match metadata.args.len() {
        2 if has_address => SignatureVariant::TwoArgTargetAmount,
        3 if has_address && has_account_id => SignatureVariant::ThreeArgSourceTargetAmount,
        2 if has_account_id => SignatureVariant::NativeOnlyTransfer,
        _ => SignatureVariant::Unknown,
    };

    CallSignature {
        variant,
        arg_names,
        arg_type_hints,
    }
}

/// Signature used when the runtime does not publish the call at all.
pub fn unresolved() -> CallSignature {
    CallSignature {
        variant: SignatureVariant::Unknown,
        arg_names: Vec::new(),
        arg_type_hints: Vec::new(),
    }
}
