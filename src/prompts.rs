pub const EBOOK_SYSTEM: &str = include_str!("../data/prompts/ebook_system.txt");
pub const EBOOK_USER: &str = include_str!("../data/prompts/ebook_user.txt");
pub const DIALOGUE_SYSTEM: &str = include_str!("../data/prompts/dialogue_system.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
