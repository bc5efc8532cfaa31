use serde::Serialize;

/// Programming language known to the execution engine.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    /// Engine-side language identifier
    pub id: u32,
    pub description: &'static str,
}

const fn lang(name: &'static str, id: u32, description: &'static str) -> Language {
    Language {
        name,
        id,
        description,
    }
}

pub const LANGUAGES: &[Language] = &[
    lang("c", 50, "C (GCC 9.2.0)"),
    lang("cpp", 54, "C++ (GCC 9.2.0)"),
    lang("cpp17", 76, "C++17 (Clang 7.0.1)"),
    lang("java", 62, "Java (OpenJDK 13.0.1)"),
    lang("python", 71, "Python (3.8.1)"),
    lang("python2", 70, "Python (2.7.17)"),
    lang("javascript", 63, "JavaScript (Node.js 12.14.0)"),
    lang("go", 60, "Go (1.13.5)"),
    lang("rust", 73, "Rust (1.40.0)"),
    lang("kotlin", 78, "Kotlin (1.3.70)"),
    lang("swift", 83, "Swift (5.2.3)"),
    lang("ruby", 72, "Ruby (2.7.0)"),
    lang("csharp", 51, "C# (Mono 6.6.0.161)"),
    lang("typescript", 74, "TypeScript (3.7.4)"),
];

/// Case-insensitive lookup by name.
pub fn find(name: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.name.eq_ignore_ascii_case(name))
}

pub fn language_id(name: &str) -> Option<u32> {
    find(name).map(|l| l.id)
}

pub fn is_supported(name: &str) -> bool {
    find(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(language_id("python"), Some(71));
        assert_eq!(language_id("PYTHON"), Some(71));
        assert_eq!(language_id("Cpp17"), Some(76));
        assert_eq!(language_id("brainfuck"), None);
        assert!(!is_supported(""));
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in LANGUAGES.iter().enumerate() {
            for b in &LANGUAGES[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.id, b.id);
            }
        }
    }
}
