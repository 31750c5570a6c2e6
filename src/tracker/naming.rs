//! Names derived from Rust type names, standing in for a function's declared name.

/// Last path segment of a type name, generics stripped. Smart pointers and
/// trait objects are looked through to the type they carry.
/// `anyhow::Error` -> `Error`, `my_app::jobs::Failure<u8>` -> `Failure`,
/// `Box<dyn std::error::Error + Send>` -> `Error`, `Arc<my_app::Oops>` -> `Oops`.
pub fn short_type_name(full: &str) -> &str {
    let mut name = full.trim_start_matches('&');
    loop {
        name = name.trim_start_matches("dyn ");
        let end = name.find(|c: char| c == '<' || c == ' ').unwrap_or(name.len());
        let path = &name[..end];
        let last = path.rsplit("::").next().unwrap_or(path);
        let inner = name[end..]
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'));
        match (last, inner) {
            ("Box" | "Arc" | "Rc", Some(inner)) => name = inner.trim().trim_start_matches('&'),
            _ => return last,
        }
    }
}

/// Kind of an error value as written in `error:` records. Only the static
/// type is known here, so a type-erased error such as `anyhow::Error` or
/// `Box<dyn Error>` reports `Error` whatever its root cause.
pub fn error_kind<E>() -> &'static str {
    short_type_name(std::any::type_name::<E>())
}

/// Declared name of a task when `F` is a named function item.
/// Closures and function pointers have no usable name.
pub fn task_name_of<F>() -> Option<String> {
    let full = std::any::type_name::<F>();
    if full.contains("{{") || full.contains('(') || full.starts_with('<') {
        return None;
    }
    let name = short_type_name(full);
    (!name.is_empty()).then(|| name.to_string())
}
