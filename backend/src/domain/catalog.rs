//! Storefront catalog: categories, products and banners.
//!
//! Prices are whole Uzbek sums held in `i64`. A product's effective price is
//! its `sale_price` when one is set, otherwise its `price`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Language;
use super::validation::{FieldError, optional_text, required_text};

pub type CategoryId = i64;
pub type ProductId = i64;
pub type BannerId = i64;

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 5000;
const URL_MAX: usize = 500;
const SKU_MAX: usize = 64;
const SEARCH_MAX: usize = 100;

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: CategoryId,
    pub name_ru: String,
    pub name_uz: String,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name_ru: String,
    pub name_uz: String,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price charged at checkout.
    pub fn effective_price(&self) -> i64 {
        effective_price(self.price, self.sale_price)
    }

    /// Name in `language`.
    pub fn name(&self, language: Language) -> &str {
        language.pick(&self.name_ru, &self.name_uz)
    }

    /// Description in `language`, if any.
    pub fn description(&self, language: Language) -> Option<&str> {
        match language {
            Language::Ru => self.description_ru.as_deref(),
            Language::Uz => self.description_uz.as_deref(),
        }
    }
}

/// `sale_price` when set, otherwise `price`.
pub fn effective_price(price: i64, sale_price: Option<i64>) -> i64 {
    sale_price.unwrap_or(price)
}

/// Promotional banner on the storefront home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    pub id: BannerId,
    pub title_ru: String,
    pub title_uz: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Validated storefront price pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    price: i64,
    sale_price: Option<i64>,
}

impl Pricing {
    /// Require `price > 0` and `0 < sale_price < price`.
    pub fn new(price: i64, sale_price: Option<i64>) -> Result<Self, FieldError> {
        if price <= 0 {
            return Err(
                FieldError::out_of_range("price", "price must be greater than zero")
                    .with_value(price),
            );
        }
        if let Some(sale) = sale_price {
            if sale <= 0 || sale >= price {
                return Err(FieldError::out_of_range(
                    "sale_price",
                    "sale_price must be greater than zero and below price",
                )
                .with_value(sale));
            }
        }
        Ok(Self { price, sale_price })
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn sale_price(&self) -> Option<i64> {
        self.sale_price
    }
}

/// Stock keeping unit: 1 to 64 characters of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sku(String);

impl Sku {
    pub fn parse(value: &str) -> Result<Self, FieldError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FieldError::required("sku"));
        }
        if trimmed.len() > SKU_MAX {
            return Err(FieldError::too_long("sku", SKU_MAX));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(FieldError::invalid_format(
                "sku",
                "sku may only contain letters, digits, '_' and '-'",
            )
            .with_value(trimmed));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn optional_url(field: &'static str, value: Option<&str>) -> Result<Option<String>, FieldError> {
    let Some(text) = optional_text(field, value, URL_MAX)? else {
        return Ok(None);
    };
    match url::Url::parse(&text) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(text)),
        _ => Err(FieldError::invalid_format(field, format!("{field} must be an http(s) URL"))
            .with_value(text)),
    }
}

/// Admin payload for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ProductInput {
    pub sku: String,
    pub name_ru: String,
    pub name_uz: String,
    #[serde(default)]
    pub description_ru: Option<String>,
    #[serde(default)]
    pub description_uz: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub sale_price: Option<i64>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Units placed in stock when the product is created; ignored on update.
    #[serde(default)]
    pub initial_stock: i32,
}

const fn default_active() -> bool {
    true
}

/// Validated product fields ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub sku: Sku,
    pub name_ru: String,
    pub name_uz: String,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
    pub pricing: Pricing,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub initial_stock: i32,
}

impl TryFrom<ProductInput> for ProductDraft {
    type Error = FieldError;

    fn try_from(input: ProductInput) -> Result<Self, Self::Error> {
        if input.initial_stock < 0 {
            return Err(FieldError::out_of_range(
                "initial_stock",
                "initial_stock must not be negative",
            )
            .with_value(input.initial_stock));
        }
        Ok(Self {
            sku: Sku::parse(&input.sku)?,
            name_ru: required_text("name_ru", &input.name_ru, NAME_MAX)?,
            name_uz: required_text("name_uz", &input.name_uz, NAME_MAX)?,
            description_ru: optional_text(
                "description_ru",
                input.description_ru.as_deref(),
                DESCRIPTION_MAX,
            )?,
            description_uz: optional_text(
                "description_uz",
                input.description_uz.as_deref(),
                DESCRIPTION_MAX,
            )?,
            pricing: Pricing::new(input.price, input.sale_price)?,
            category_id: input.category_id,
            image_url: optional_url("image_url", input.image_url.as_deref())?,
            is_active: input.is_active,
            initial_stock: input.initial_stock,
        })
    }
}

/// Admin payload for creating or replacing a category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CategoryInput {
    pub name_ru: String,
    pub name_uz: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Validated category fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name_ru: String,
    pub name_uz: String,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl TryFrom<CategoryInput> for CategoryDraft {
    type Error = FieldError;

    fn try_from(input: CategoryInput) -> Result<Self, Self::Error> {
        Ok(Self {
            name_ru: required_text("name_ru", &input.name_ru, NAME_MAX)?,
            name_uz: required_text("name_uz", &input.name_uz, NAME_MAX)?,
            image_url: optional_url("image_url", input.image_url.as_deref())?,
            sort_order: input.sort_order,
            is_active: input.is_active,
        })
    }
}

/// Admin payload for creating a banner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct BannerInput {
    pub title_ru: String,
    pub title_uz: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Validated banner fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerDraft {
    pub title_ru: String,
    pub title_uz: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl TryFrom<BannerInput> for BannerDraft {
    type Error = FieldError;

    fn try_from(input: BannerInput) -> Result<Self, Self::Error> {
        let image_url = optional_url("image_url", Some(input.image_url.as_str()))?
            .ok_or_else(|| FieldError::required("image_url"))?;
        Ok(Self {
            title_ru: required_text("title_ru", &input.title_ru, NAME_MAX)?,
            title_uz: required_text("title_uz", &input.title_uz, NAME_MAX)?,
            image_url,
            link_url: optional_url("link_url", input.link_url.as_deref())?,
            sort_order: input.sort_order,
            is_active: input.is_active,
        })
    }
}

/// Product listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring matched against both names and the SKU.
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn new(category_id: Option<CategoryId>, search: Option<&str>) -> Result<Self, FieldError> {
        Ok(Self {
            category_id,
            search: optional_text("search", search, SEARCH_MAX)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::FieldErrorCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn input() -> ProductInput {
        ProductInput {
            sku: "TEA-001".to_owned(),
            name_ru: "Чай зелёный".to_owned(),
            name_uz: "Yashil choy".to_owned(),
            description_ru: Some("  ".to_owned()),
            description_uz: None,
            price: 25_000,
            sale_price: Some(20_000),
            category_id: Some(1),
            image_url: Some("https://cdn.example.uz/tea.png".to_owned()),
            is_active: true,
            initial_stock: 10,
        }
    }

    #[rstest]
    fn valid_input_builds_draft(input: ProductInput) {
        let draft = ProductDraft::try_from(input).expect("valid product");
        assert_eq!(draft.sku.as_str(), "TEA-001");
        assert_eq!(draft.description_ru, None);
        assert_eq!(draft.pricing.sale_price(), Some(20_000));
    }

    #[rstest]
    #[case(0, None, "price")]
    #[case(-5, None, "price")]
    #[case(1000, Some(1000), "sale_price")]
    #[case(1000, Some(0), "sale_price")]
    fn rejects_invalid_pricing(
        #[case] price: i64,
        #[case] sale_price: Option<i64>,
        #[case] field: &str,
    ) {
        let err = Pricing::new(price, sale_price).expect_err("invalid pricing");
        assert_eq!(err.field(), field);
        assert_eq!(err.code(), FieldErrorCode::OutOfRange);
    }

    #[rstest]
    #[case("tea 001")]
    #[case("чай")]
    #[case("")]
    fn rejects_invalid_sku(#[case] sku: &str) {
        assert!(Sku::parse(sku).is_err());
    }

    #[rstest]
    fn rejects_overlong_sku() {
        let err = Sku::parse(&"A".repeat(65)).expect_err("too long");
        assert_eq!(err.code(), FieldErrorCode::TooLong);
    }

    #[rstest]
    fn rejects_blank_name(mut input: ProductInput) {
        input.name_uz = "   ".to_owned();
        let err = ProductDraft::try_from(input).expect_err("blank name");
        assert_eq!(err.field(), "name_uz");
    }

    #[rstest]
    fn rejects_non_http_image(mut input: ProductInput) {
        input.image_url = Some("ftp://example.uz/tea.png".to_owned());
        let err = ProductDraft::try_from(input).expect_err("bad url");
        assert_eq!(err.field(), "image_url");
    }

    #[rstest]
    fn rejects_negative_initial_stock(mut input: ProductInput) {
        input.initial_stock = -1;
        let err = ProductDraft::try_from(input).expect_err("negative stock");
        assert_eq!(err.field(), "initial_stock");
    }

    #[rstest]
    fn banner_requires_image() {
        let err = BannerDraft::try_from(BannerInput {
            title_ru: "Скидки".to_owned(),
            title_uz: "Chegirmalar".to_owned(),
            image_url: " ".to_owned(),
            link_url: None,
            sort_order: 0,
            is_active: true,
        })
        .expect_err("missing image");
        assert_eq!(err.field(), "image_url");
    }

    #[rstest]
    #[case(1000, None, 1000)]
    #[case(1000, Some(800), 800)]
    fn effective_price_prefers_sale(
        #[case] price: i64,
        #[case] sale: Option<i64>,
        #[case] expected: i64,
    ) {
        assert_eq!(effective_price(price, sale), expected);
    }

    #[rstest]
    fn filter_drops_blank_search() {
        let filter = ProductFilter::new(None, Some("  ")).expect("valid filter");
        assert_eq!(filter.search, None);
    }
}
