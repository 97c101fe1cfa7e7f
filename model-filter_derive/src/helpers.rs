/// Snake-case an identifier the same way the runtime crate does, so
/// that the default entity name matches runtime field normalization.
pub fn snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (index, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = index > 0
                && (chars[index - 1].is_lowercase() || chars[index - 1].is_ascii_digit());
            let before_lower = chars
                .get(index + 1)
                .map(|next| next.is_lowercase())
                .unwrap_or(false);
            if index > 0 && (after_lower || before_lower) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
