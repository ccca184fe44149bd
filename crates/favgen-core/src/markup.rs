use crate::icons::{icon_file_name, IconRole};

/// Output order is significant: generic icons, then the shortcut icon, then
/// apple-touch icons. Within each role, ascending size.
const MARKUP_ORDER: [(IconRole, &[u32]); 3] = [
    (IconRole::Icon, &[32, 128, 192]),
    (IconRole::ShortcutIcon, &[196]),
    (IconRole::TouchIcon, &[152, 167, 180]),
];

/// Render the link elements for the given generated sizes. Sizes missing from
/// `sizes_present` are skipped; a complete run supplies the whole table.
pub fn render_links(base_url: &str, destination_dir: &str, sizes_present: &[u32]) -> String {
    let mut out = String::new();
    for (role, sizes) in MARKUP_ORDER {
        for &size in sizes {
            if !sizes_present.contains(&size) {
                continue;
            }
            out.push_str(&format!(
                "<link rel=\"{}\" href=\"{}{}{}\" sizes=\"{}x{}\">\n",
                role.rel(),
                base_url,
                destination_dir,
                icon_file_name(size),
                size,
                size
            ));
        }
    }
    out
}
