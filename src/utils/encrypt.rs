use base64::{engine::general_purpose, Engine as _};

// 计算MD5
pub fn md5_hash(data: &str) -> String {
    format!("{:x}", md5::compute(data))
}

// base64 编码
pub fn base64_encode(data: &str) -> String {
    general_purpose::STANDARD.encode(data)
}

/// 管理接口签名: md5(base64(去掉空白的body + secret))
pub fn body_signature(body: &str, secret: &str) -> String {
    let raw_data: String = format!("{body}{secret}")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    md5_hash(&base64_encode(&raw_data))
}

pub fn verify_body_signature(body: &str, secret: &str, signature: &str) -> bool {
    !signature.is_empty() && body_signature(body, secret).eq_ignore_ascii_case(signature.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_is_lower_hex() {
        assert_eq!(md5_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn signature_ignores_whitespace_in_body() {
        let compact = body_signature(r#"{"guild_id":"42"}"#, "secret");
        let pretty = body_signature("{ \"guild_id\": \"42\" }\n", "secret");
        assert_eq!(compact, pretty);
        assert!(verify_body_signature(r#"{"guild_id":"42"}"#, "secret", &compact.to_uppercase()));
    }

    #[test]
    fn wrong_secret_or_empty_signature_fails() {
        let signature = body_signature("{}", "secret");
        assert!(!verify_body_signature("{}", "other", &signature));
        assert!(!verify_body_signature("{}", "secret", ""));
    }
}
