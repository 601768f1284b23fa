use serde::{Deserialize, Deserializer, Serialize};

/// Full recipe record as the catalog describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub thumbnail_url: String,
    pub category: String,
    pub area: String,
    pub instructions: String,
    pub tags: Vec<String>,
    pub youtube_url: Option<String>,
    pub source_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

/// One ingredient line, e.g. "soy sauce - 3/4 cup"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

impl std::fmt::Display for Ingredient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.measure.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} - {}", self.name, self.measure)
        }
    }
}

impl Recipe {
    /// Embeddable player URL for the recipe's YouTube video
    pub fn youtube_embed_url(&self) -> Option<String> {
        let url = self.youtube_url.as_deref()?;
        let (_, query) = url.split_once("v=")?;
        let video_id = query.split('&').next().filter(|id| !id.is_empty())?;
        Some(format!("https://www.youtube.com/embed/{}", video_id))
    }

    /// "Chicken | Japanese"
    pub fn subtitle(&self) -> String {
        format!("{} | {}", self.category, self.area)
    }
}

/// The slice of a recipe kept in the favorites list.
///
/// Display fields are copied when the recipe is favorited and never
/// refreshed afterwards. Field names on disk are camelCase; the
/// `idMeal`/`strMeal` aliases read lists written by the browser build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    #[serde(alias = "idMeal")]
    pub id: String,
    #[serde(alias = "strMeal", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(alias = "strMealThumb", default, deserialize_with = "null_as_empty")]
    pub thumbnail_url: String,
    #[serde(alias = "strCategory", default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(alias = "strArea", default, deserialize_with = "null_as_empty")]
    pub area: String,
}

impl RecipeSummary {
    pub fn subtitle(&self) -> String {
        format!("{} | {}", self.category, self.area)
    }
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            thumbnail_url: recipe.thumbnail_url.clone(),
            category: recipe.category.clone(),
            area: recipe.area.clone(),
        }
    }
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            thumbnail_url: recipe.thumbnail_url,
            category: recipe.category,
            area: recipe.area,
        }
    }
}

impl From<&RecipeSummary> for RecipeSummary {
    fn from(summary: &RecipeSummary) -> Self {
        summary.clone()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        Recipe {
            id: "52772".to_string(),
            name: "Teriyaki Chicken Casserole".to_string(),
            thumbnail_url: "u1".to_string(),
            category: "Chicken".to_string(),
            area: "Japanese".to_string(),
            instructions: "Preheat oven to 350F.".to_string(),
            tags: vec!["Meat".to_string(), "Casserole".to_string()],
            youtube_url: Some("https://www.youtube.com/watch?v=4aZr5hZXP_s".to_string()),
            source_url: None,
            ingredients: vec![Ingredient {
                name: "soy sauce".to_string(),
                measure: "3/4 cup".to_string(),
            }],
        }
    }

    #[test]
    fn test_summary_projects_display_fields() {
        let summary = RecipeSummary::from(&recipe());
        assert_eq!(
            summary,
            RecipeSummary {
                id: "52772".to_string(),
                name: "Teriyaki Chicken Casserole".to_string(),
                thumbnail_url: "u1".to_string(),
                category: "Chicken".to_string(),
                area: "Japanese".to_string(),
            }
        );
    }

    #[test]
    fn test_summary_serializes_exactly_five_fields() {
        let json = serde_json::to_value(RecipeSummary::from(&recipe())).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["area", "category", "id", "name", "thumbnailUrl"]);
    }

    #[test]
    fn test_summary_reads_browser_cookie_keys() {
        let legacy = r#"{"idMeal":"52772","strMeal":"Teriyaki Chicken Casserole",
            "strMealThumb":"u1","strCategory":"Chicken","strArea":null}"#;
        let summary: RecipeSummary = serde_json::from_str(legacy).unwrap();

        assert_eq!(summary.id, "52772");
        assert_eq!(summary.category, "Chicken");
        assert_eq!(summary.area, "");
    }

    #[test]
    fn test_youtube_embed_url() {
        let mut r = recipe();
        assert_eq!(
            r.youtube_embed_url().as_deref(),
            Some("https://www.youtube.com/embed/4aZr5hZXP_s")
        );

        r.youtube_url = Some("https://www.youtube.com/watch?v=abc&t=10".to_string());
        assert_eq!(
            r.youtube_embed_url().as_deref(),
            Some("https://www.youtube.com/embed/abc")
        );

        r.youtube_url = Some("https://youtu.be/abc".to_string());
        assert_eq!(r.youtube_embed_url(), None);

        r.youtube_url = None;
        assert_eq!(r.youtube_embed_url(), None);
    }

    #[test]
    fn test_ingredient_display() {
        let with_measure = Ingredient {
            name: "water".to_string(),
            measure: "1/2 cup".to_string(),
        };
        let bare = Ingredient {
            name: "salt".to_string(),
            measure: String::new(),
        };
        assert_eq!(with_measure.to_string(), "water - 1/2 cup");
        assert_eq!(bare.to_string(), "salt");
    }
}
