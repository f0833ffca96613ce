use cardano_bridge_common::{
    KeyHash, PolicyError, PolicyScript, configuration::PolicyConfig,
};

/// `AtLeast(threshold, [Signature(h) for h in key_hashes])`, keeping the order of `key_hashes`
pub fn build_k_of_n(threshold: u32, key_hashes: &[KeyHash]) -> Result<PolicyScript, PolicyError> {
    if threshold == 0 || threshold as usize > key_hashes.len() {
        return Err(PolicyError::InvalidThreshold {
            threshold,
            participants: key_hashes.len(),
        });
    }

    Ok(PolicyScript::AtLeast(
        threshold,
        key_hashes.iter().copied().map(PolicyScript::Signature).collect(),
    ))
}

pub fn policy_from_config(config: &PolicyConfig) -> Result<PolicyScript, PolicyError> {
    build_k_of_n(config.threshold, &config.key_hashes)
}
