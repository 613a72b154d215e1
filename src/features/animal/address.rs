//! 地址规范化与格式校验（只校验形状，校验和与公钥还原由上游负责）

/// base32 字母表（不含 0、2、l、v）
const ALPHABET: &[u8] = b"13456789abcdefghijkmnopqrstuwxyz";

/// 前缀之后的字符数：1 位类型标记 + 59 位编码
const BODY_LEN: usize = 60;

/// `<prefix>_` + (`1` | `3`) + 59 个 base32 字符
pub fn is_valid_shape(address: &str, prefix: &str) -> bool {
    let Some(rest) = address
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('_'))
    else {
        return false;
    };
    let bytes = rest.as_bytes();
    bytes.len() == BODY_LEN
        && matches!(bytes[0], b'1' | b'3')
        && bytes[1..].iter().all(|b| ALPHABET.contains(b))
}

/// 校验地址，原样返回；地址同时用于 vanity 查找和摘要派生，不做任何改写
pub fn parse<'a>(address: &'a str, prefix: &str) -> Option<&'a str> {
    is_valid_shape(address, prefix).then_some(address)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_shape, parse};

    fn addr(kind: char, body: &str) -> String {
        format!("paw_{kind}{body}")
    }

    #[test]
    fn accepts_well_formed_addresses() {
        let body = "13456789abcdefghijkmnopqrstuwxyz".repeat(2)[..59].to_string();
        assert!(is_valid_shape(&addr('1', &body), "paw"));
        assert!(is_valid_shape(&addr('3', &body), "paw"));
        assert_eq!(parse(&addr('1', &body), "paw"), Some(addr('1', &body).as_str()));
    }

    #[test]
    fn surrounding_whitespace_is_rejected() {
        let good = addr('1', &"1".repeat(59));
        assert_eq!(parse(&format!(" {good}"), "paw"), None);
        assert_eq!(parse(&format!("{good}\n"), "paw"), None);
        assert_eq!(parse(&format!("{good} "), "paw"), None);
    }

    #[test]
    fn rejects_bad_shapes() {
        let body = "1".repeat(59);
        assert!(!is_valid_shape(&addr('2', &body), "paw"));
        assert!(!is_valid_shape(&addr('1', &body[..58]), "paw"));
        assert!(!is_valid_shape(&format!("{}1", addr('1', &body)), "paw"));
        assert!(!is_valid_shape(&format!("nano_1{body}"), "paw"));
        assert!(!is_valid_shape(&addr('1', &format!("{}l", &body[..58])), "paw"));
        assert!(!is_valid_shape(&addr('1', &format!("{}A", &body[..58])), "paw"));
        assert!(!is_valid_shape("", "paw"));
    }

    #[test]
    fn prefix_is_configurable() {
        let body = "3".repeat(59);
        assert!(is_valid_shape(&format!("nano_1{body}"), "nano"));
    }
}
