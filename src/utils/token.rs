use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

/// 随机字节数，编码后为 43 个 URL 安全字符
pub const TOKEN_BYTES: usize = 32;

/// 生成分享 token（CSPRNG，base64url 无填充）
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
