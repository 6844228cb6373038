use std::sync::Arc;

/// 管理接口签名用的密钥
#[derive(Clone)]
pub struct SignatureState {
    pub admin_secret: Arc<String>,
}

impl SignatureState {
    pub fn new(admin_secret: &str) -> Self {
        Self {
            admin_secret: Arc::new(admin_secret.to_string()),
        }
    }
}
