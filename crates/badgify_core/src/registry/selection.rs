//! Badge slug filters accepted by registry lookups and sync passes.

/// Which recipes an operation should consider.
///
/// Converts from a single slug or any list of slugs; `All` selects every
/// registered recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BadgeSelection<'a> {
    #[default]
    All,
    Slugs(Vec<&'a str>),
}

impl BadgeSelection<'_> {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<'a> From<&'a str> for BadgeSelection<'a> {
    fn from(value: &'a str) -> Self {
        Self::Slugs(vec![value])
    }
}

impl<'a> From<&'a String> for BadgeSelection<'a> {
    fn from(value: &'a String) -> Self {
        Self::Slugs(vec![value.as_str()])
    }
}

impl<'a> From<Vec<&'a str>> for BadgeSelection<'a> {
    fn from(value: Vec<&'a str>) -> Self {
        Self::Slugs(value)
    }
}

impl<'a> From<&'a [&'a str]> for BadgeSelection<'a> {
    fn from(value: &'a [&'a str]) -> Self {
        Self::Slugs(value.to_vec())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for BadgeSelection<'a> {
    fn from(value: [&'a str; N]) -> Self {
        Self::Slugs(value.to_vec())
    }
}

impl<'a> From<&'a [String]> for BadgeSelection<'a> {
    fn from(value: &'a [String]) -> Self {
        Self::Slugs(value.iter().map(String::as_str).collect())
    }
}

impl<'a> From<&'a Vec<String>> for BadgeSelection<'a> {
    fn from(value: &'a Vec<String>) -> Self {
        Self::from(value.as_slice())
    }
}

/// `None` selects everything, mirroring an omitted filter.
impl<'a, T: Into<BadgeSelection<'a>>> From<Option<T>> for BadgeSelection<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::All, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::BadgeSelection;

    #[test]
    fn conversions_cover_single_and_many() {
        assert_eq!(
            BadgeSelection::from("one"),
            BadgeSelection::Slugs(vec!["one"])
        );
        assert_eq!(
            BadgeSelection::from(["a", "b"]),
            BadgeSelection::Slugs(vec!["a", "b"])
        );
        let owned = vec!["x".to_string()];
        assert_eq!(
            BadgeSelection::from(&owned),
            BadgeSelection::Slugs(vec!["x"])
        );
        assert!(BadgeSelection::from(None::<&str>).is_all());
        assert!(BadgeSelection::default().is_all());
    }
}
