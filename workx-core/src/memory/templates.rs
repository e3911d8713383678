use crate::render::{Locale, TemplateKey, TemplateProvider};
use crate::store::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Templates held in a map.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    texts: HashMap<(TemplateKey, Locale), String>,
}

impl StaticTemplates {
    /// Every template in both locales, with its slug as the text.
    pub fn echo() -> Self {
        let mut templates = Self::default();
        for &key in TemplateKey::ALL {
            for locale in [Locale::Hebrew, Locale::Russian] {
                templates.insert(key, locale, key.slug());
            }
        }
        templates
    }

    pub fn insert(&mut self, key: TemplateKey, locale: Locale, text: impl Into<String>) {
        self.texts.insert((key, locale), text.into());
    }

    pub fn remove(&mut self, key: TemplateKey, locale: Locale) {
        self.texts.remove(&(key, locale));
    }
}

#[async_trait]
impl TemplateProvider for StaticTemplates {
    async fn get(&self, key: TemplateKey, locale: Locale) -> Result<Option<String>, StoreError> {
        Ok(self.texts.get(&(key, locale)).cloned())
    }
}
