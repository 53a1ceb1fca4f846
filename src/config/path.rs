use serde_json::Value;

/// Split a dotted key into segments; `\.` keeps a literal dot inside a segment.
pub fn segments(key: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => out.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    out.push(current);
    out
}

/// Resolve a dotted path inside a document. Array elements are addressed by
/// position (`server.ports.0`).
pub fn lookup<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return Some(document);
    }
    segments(key)
        .iter()
        .try_fold(document, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_lookup() {
        let doc = json!({"rady": {"redis": {"port": 6937}, "mysql": {"utf-8": true}}});
        assert_eq!(lookup(&doc, "rady.redis.port"), Some(&json!(6937)));
        assert_eq!(lookup(&doc, "rady.mysql.utf-8"), Some(&json!(true)));
        assert_eq!(lookup(&doc, "rady.redis.host"), None);
        assert_eq!(lookup(&doc, "rady.redis.port.deeper"), None);
    }

    #[test]
    fn test_array_positions() {
        let doc = json!({"server": {"ports": [80, 443]}});
        assert_eq!(lookup(&doc, "server.ports.1"), Some(&json!(443)));
        assert_eq!(lookup(&doc, "server.ports.2"), None);
        assert_eq!(lookup(&doc, "server.ports.x"), None);
    }

    #[test]
    fn test_escaped_dot() {
        let doc = json!({"hosts": {"example.com": {"tls": true}}});
        assert_eq!(segments(r"hosts.example\.com.tls"), vec!["hosts", "example.com", "tls"]);
        assert_eq!(lookup(&doc, r"hosts.example\.com.tls"), Some(&json!(true)));
    }

    #[test]
    fn test_empty_key_is_root() {
        let doc = json!({"a": 1});
        assert_eq!(lookup(&doc, ""), Some(&doc));
    }
}
