use std::borrow::Cow;

pub struct Meta<'a> {
    pub meta_title: Cow<'a, str>,
    pub meta_description: Cow<'a, str>,
    pub meta_keywords: Cow<'a, str>,
    pub meta_author: Cow<'a, str>,
    pub meta_url: Cow<'a, str>,
}

impl Default for Meta<'_> {
    fn default() -> Self {
        Self {
            meta_title: "Team Builder".into(),
            meta_description: env!("CARGO_PKG_DESCRIPTION").into(),
            meta_keywords: "projects,teams,skills,positions".into(),
            meta_author: env!("CARGO_PKG_AUTHORS").into(),
            meta_url: env!("CARGO_PKG_REPOSITORY").into(),
        }
    }
}

impl<'a> Meta<'a> {
    pub fn with_title(title: impl Into<Cow<'a, str>>) -> Self {
        Self {
            meta_title: title.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_title_keeps_package_defaults() {
        let meta = Meta::with_title("Search");
        assert_eq!(meta.meta_title, "Search");
        assert_eq!(meta.meta_url, env!("CARGO_PKG_REPOSITORY"));
    }
}
