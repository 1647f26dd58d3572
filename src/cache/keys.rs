//! Redis key layout

const PREFIX: &str = "stbl";

/// Key holding the cached provider tokens for a credential hash
pub fn token_cache_key(credentials_hash: &str) -> String {
    format!("{}:token_cache:{}", PREFIX, credentials_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cache_key() {
        assert_eq!(token_cache_key("abc"), "stbl:token_cache:abc");
    }
}
