//! Path-keyed settings rendered as nested XML
//!
//! A key such as `alice/networks/ip` becomes
//! `<alice><networks><ip>..</ip></networks></alice>`. List values repeat the
//! leaf element once per item.

use std::collections::BTreeMap;

use tracing::warn;

use crate::crd::Settings;

use super::xml::{is_valid_element_name, XmlWriter};

#[derive(Debug, Default)]
struct SettingsNode {
    values: Vec<String>,
    children: BTreeMap<String, SettingsNode>,
}

impl SettingsNode {
    fn from_settings(settings: &Settings) -> Self {
        let mut root = Self::default();
        for (path, setting) in settings {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                warn!(path = %path, "setting path has no elements, skipping");
                continue;
            }
            if let Some(bad) = segments.iter().find(|s| !is_valid_element_name(s)) {
                warn!(
                    path = %path,
                    element = %bad,
                    "setting path has an invalid element name, skipping"
                );
                continue;
            }

            let node = segments.iter().fold(&mut root, |node, segment| {
                node.children.entry((*segment).to_string()).or_default()
            });
            node.values.extend(setting.values());
        }
        root
    }

    fn write(&self, w: &mut XmlWriter) {
        for (tag, child) in &self.children {
            for value in &child.values {
                w.element(tag, value);
            }
            if !child.children.is_empty() {
                w.open(tag);
                child.write(w);
                w.close(tag);
            }
        }
    }
}

/// Render settings under `section`, or directly under the root when `None`
///
/// Returns an empty string when there is nothing to render.
pub fn generate_settings_section(section: Option<&str>, settings: &Settings) -> String {
    let tree = SettingsNode::from_settings(settings);
    if tree.children.is_empty() {
        return String::new();
    }

    let mut w = XmlWriter::document();
    match section {
        Some(tag) => {
            w.open(tag);
            tree.write(&mut w);
            w.close(tag);
        }
        None => tree.write(&mut w),
    }
    w.finish()
}

/// `users.xml`
pub fn generate_users(users: &Settings) -> String {
    generate_settings_section(Some("users"), users)
}

/// `profiles.xml`
pub fn generate_profiles(profiles: &Settings) -> String {
    generate_settings_section(Some("profiles"), profiles)
}

/// `quotas.xml`
pub fn generate_quotas(quotas: &Settings) -> String {
    generate_settings_section(Some("quotas"), quotas)
}

/// `settings.xml`
pub fn generate_settings(settings: &Settings) -> String {
    generate_settings_section(None, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::Setting;

    fn settings(entries: &[(&str, Setting)]) -> Settings {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn story_users_are_nested_by_path() {
        let users = settings(&[
            ("test/password", Setting::Text("qwerty".to_string())),
            (
                "test/networks/ip",
                Setting::List(vec!["::1".to_string(), "127.0.0.1".to_string()]),
            ),
            ("test/profile", Setting::Text("default".to_string())),
        ]);

        assert_eq!(
            generate_users(&users),
            "<yandex>\n\
             \x20   <users>\n\
             \x20       <test>\n\
             \x20           <networks>\n\
             \x20               <ip>::1</ip>\n\
             \x20               <ip>127.0.0.1</ip>\n\
             \x20           </networks>\n\
             \x20           <password>qwerty</password>\n\
             \x20           <profile>default</profile>\n\
             \x20       </test>\n\
             \x20   </users>\n\
             </yandex>\n"
        );
    }

    #[test]
    fn story_settings_sit_under_root() {
        let global = settings(&[
            ("max_connections", Setting::Integer(4096)),
            ("compression/case/method", Setting::Text("zstd".to_string())),
        ]);

        assert_eq!(
            generate_settings(&global),
            "<yandex>\n\
             \x20   <compression>\n\
             \x20       <case>\n\
             \x20           <method>zstd</method>\n\
             \x20       </case>\n\
             \x20   </compression>\n\
             \x20   <max_connections>4096</max_connections>\n\
             </yandex>\n"
        );
    }

    #[test]
    fn story_empty_settings_render_nothing() {
        assert_eq!(generate_profiles(&Settings::new()), "");
        assert_eq!(generate_quotas(&Settings::new()), "");
        assert_eq!(
            generate_settings(&settings(&[("/", Setting::Bool(true))])),
            ""
        );
    }

    #[test]
    fn story_paths_with_invalid_element_names_are_skipped() {
        let users = settings(&[
            ("bad user/password", Setting::Text("x".to_string())),
            ("admin/<script>", Setting::Text("x".to_string())),
            ("alice/password", Setting::Text("secret".to_string())),
        ]);

        let xml = generate_users(&users);
        assert!(xml.contains("<alice>"));
        assert!(xml.contains("<password>secret</password>"));
        assert!(!xml.contains("bad user"));
        assert!(!xml.contains("<admin>"));
        assert!(!xml.contains("script"));

        let only_bad = settings(&[("1st/limit", Setting::Integer(1))]);
        assert_eq!(generate_settings(&only_bad), "");
    }

    #[test]
    fn story_values_are_escaped() {
        let profiles = settings(&[("default/log_queries", Setting::Text("a&b".to_string()))]);
        assert!(generate_profiles(&profiles).contains("<log_queries>a&amp;b</log_queries>"));
    }
}
