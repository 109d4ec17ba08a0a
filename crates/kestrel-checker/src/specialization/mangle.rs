/// Mangled name of a specialization: `prefix.name$T1$T2`.
pub fn mangle(prefix: &str, name: &str, key: &[String]) -> String {
    let mut mangled = String::with_capacity(prefix.len() + name.len() + key.len() * 4 + 1);
    if !prefix.is_empty() {
        mangled.push_str(prefix);
        mangled.push('.');
    }
    mangled.push_str(name);
    for ty in key {
        mangled.push('$');
        mangled.push_str(ty);
    }
    mangled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_key_types() {
        let key = vec!["i64".to_string(), "[]f32".to_string()];
        assert_eq!(mangle("main", "pair", &key), "main.pair$i64$[]f32");
    }

    #[test]
    fn empty_prefix() {
        assert_eq!(mangle("", "id", &["u8".to_string()]), "id$u8");
    }
}
