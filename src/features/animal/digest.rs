use std::fmt;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;

use crate::error::AppError;

/// 摘要固定长度（字节）
pub const DIGEST_LEN: usize = 64;

/// 选择逻辑的唯一熵源。只能由恰好 64 字节（或 128 个十六进制字符）构造。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashDigest([u8; DIGEST_LEN]);

impl HashDigest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AppError> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| {
            AppError::Validation(format!(
                "digest must be exactly {DIGEST_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(input: &str) -> Result<Self, AppError> {
        let bytes = hex::decode(input.trim())
            .map_err(|e| AppError::Validation(format!("digest is not valid hex: {e}")))?;
        Self::from_slice(&bytes)
    }

    /// 随机摘要，仅供测试接口使用
    pub fn random() -> Self {
        let mut bytes = [0u8; DIGEST_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// 以大端序读取 `offset..offset + 4` 处的 u32
    pub fn word(&self, offset: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.0[offset..offset + 4]);
        u32::from_be_bytes(buf)
    }

    /// 读取 `offset..offset + 4` 处的原始 4 字节
    pub fn quad(&self, offset: usize) -> [u8; 4] {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.0[offset..offset + 4]);
        buf
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({})", self.to_hex())
    }
}

/// 地址 → 摘要 的派生方式。上游可替换为自己的实现（例如基于公钥）。
pub trait DigestSource: Send + Sync {
    fn digest_for(&self, address: &str) -> HashDigest;
}

/// 默认摘要派生：以服务密钥为 key，对规范化地址做 HMAC-SHA512
#[derive(Clone)]
pub struct SeededDigest {
    mac: Hmac<Sha512>,
}

impl SeededDigest {
    pub fn new(seed: &str) -> Result<Self, AppError> {
        if seed.trim().is_empty() {
            return Err(AppError::Validation("animal.seed 不能为空".to_string()));
        }
        let mac = Hmac::<Sha512>::new_from_slice(seed.as_bytes())
            .map_err(|e| AppError::Internal(format!("初始化 HMAC 失败: {e}")))?;
        Ok(Self { mac })
    }
}

impl DigestSource for SeededDigest {
    fn digest_for(&self, address: &str) -> HashDigest {
        let mut mac = self.mac.clone();
        mac.update(address.as_bytes());
        let out = mac.finalize().into_bytes();
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&out);
        HashDigest(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{DIGEST_LEN, DigestSource, HashDigest, SeededDigest};

    #[test]
    fn rejects_wrong_length() {
        assert!(HashDigest::from_slice(&[0u8; 32]).is_err());
        assert!(HashDigest::from_hex("abcd").is_err());
        assert!(HashDigest::from_hex(&"zz".repeat(DIGEST_LEN)).is_err());
    }

    #[test]
    fn hex_round_trip_and_words() {
        let bytes: Vec<u8> = (0..DIGEST_LEN as u8).collect();
        let d = HashDigest::from_slice(&bytes).expect("64 bytes");
        assert_eq!(HashDigest::from_hex(&d.to_hex()).expect("hex"), d);
        assert_eq!(d.word(0), 0x0001_0203);
        assert_eq!(d.quad(60), [60, 61, 62, 63]);
    }

    #[test]
    fn seeded_digest_is_stable_and_seed_dependent() {
        let a = SeededDigest::new("seed-a").expect("seed");
        let b = SeededDigest::new("seed-b").expect("seed");
        let addr = "paw_1abc";
        assert_eq!(a.digest_for(addr), a.digest_for(addr));
        assert_ne!(a.digest_for(addr), b.digest_for(addr));
        assert_ne!(a.digest_for(addr), a.digest_for("paw_1abd"));
    }

    #[test]
    fn empty_seed_is_rejected() {
        assert!(SeededDigest::new("  ").is_err());
    }
}
