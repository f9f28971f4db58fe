use poem_openapi::Object;

use crate::presentation::models::OfferTypeKind;

#[derive(Object, Debug)]
pub struct ListingWebhookDto {
    #[oai(validator(min_length = 1))]
    pub id: String,
    #[oai(validator(min_length = 1, max_length = 500))]
    pub title: String,
    #[oai(validator(max_length = 5000))]
    pub description: Option<String>,
    pub price: f64,
    #[oai(default = "default_currency", validator(min_length = 2, max_length = 5))]
    pub currency: String,
    pub area: f64,
    pub city_id: i64,
    #[oai(validator(min_length = 1))]
    pub city_name: String,
    #[oai(validator(min_length = 1))]
    pub district_name: String,
    pub subdistrict_name: Option<String>,
    #[oai(validator(min_length = 1))]
    pub category: String,
    #[oai(validator(min_length = 1))]
    pub subcategory: String,
    #[oai(default)]
    pub images: Vec<String>,
    #[oai(default)]
    pub offer_type: OfferTypeKind,
    #[oai(validator(max_length = 20))]
    pub phone: Option<String>,
    #[oai(validator(min_length = 1))]
    pub url: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub floors: Option<u32>,
    pub age: Option<u32>,
    pub frontage_width: Option<f64>,
    pub frontage_depth: Option<f64>,
}

fn default_currency() -> String {
    "IQD".to_string()
}

#[derive(Object, Debug)]
pub struct BatchWebhookRequestDto {
    pub listings: Vec<ListingWebhookDto>,
}
