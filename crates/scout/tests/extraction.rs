// ABOUTME: Fixture-driven tests running the built-in catalog over saved product pages.
// ABOUTME: Covers both selector generations per platform, image heuristics and the extraction laws.

use pretty_assertions::assert_eq;
use pricetag_scout::{
    detect_platform, extract, load_builtin_catalog, Catalog, Client, Document, Field, FieldSpec,
    ImageRules, Locator, PlatformCatalog, PlatformId, ResultMap,
};
use std::fs;

fn load_html_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/{}.html",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

fn extract_fixture(name: &str, platform: PlatformId) -> ResultMap {
    let catalog = load_builtin_catalog().unwrap();
    let doc = Document::parse(&load_html_fixture(name));
    extract(&doc, &catalog, platform).unwrap()
}

fn as_pairs(result: &ResultMap) -> Vec<(&'static str, String)> {
    result
        .iter()
        .map(|(field, value)| (field.as_str(), value.to_string()))
        .collect()
}

#[test]
fn flipkart_current_layout() {
    let result = extract_fixture("flipkart", PlatformId::Flipkart);
    assert_eq!(
        as_pairs(&result),
        vec![
            ("title", "Apple iPhone 15 (Black, 128 GB)".to_string()),
            ("price", "₹65,999".to_string()),
            ("mrp", "₹79,600".to_string()),
            ("discount", "17% off".to_string()),
            (
                "image",
                "https://rukminim2.flixcart.com/image/832/832/xif0q/mobile/h/d/9/-original-imagtc2qzgnnuhxh.jpeg?q=70"
                    .to_string()
            ),
        ]
    );
}

#[test]
fn flipkart_legacy_layout_uses_older_selectors() {
    let result = extract_fixture("flipkart_legacy", PlatformId::Flipkart);
    assert_eq!(
        result.get(Field::Title),
        Some("Redmi Note 12 (Sunrise Gold, 128 GB) (6 GB RAM)")
    );
    assert_eq!(result.get(Field::Price), Some("₹14,999"));
    assert_eq!(result.get(Field::Mrp), Some("₹18,999"));
    assert_eq!(result.get(Field::Discount), Some("21% off"));
    assert_eq!(
        result.get(Field::Image),
        Some("https://rukminim1.flixcart.com/image/1080/1080/xif0q/mobile/redmi-note-12.jpeg?q=70")
    );
}

#[test]
fn amazon_product_page() {
    let result = extract_fixture("amazon", PlatformId::Amazon);
    assert_eq!(
        result.get(Field::Title),
        Some("Echo Dot (5th Gen) | Smart speaker with Bigger sound, Motion Detection, Temperature Sensor, Alexa and Bluetooth| Blue")
    );
    assert_eq!(result.get(Field::Price), Some("5,499."));
    assert_eq!(result.get(Field::Mrp), Some("₹6,499.00"));
    assert_eq!(result.get(Field::Discount), Some("-15%"));
    assert_eq!(
        result.get(Field::Image),
        Some("https://m.media-amazon.com/images/I/61MbLLagiVL._SL3000_.jpg")
    );
}

#[test]
fn amazon_image_falls_back_to_embedded_json() {
    let result = extract_fixture("amazon_embedded", PlatformId::Amazon);
    assert_eq!(
        result.get(Field::Title),
        Some("boAt Rockerz 450 Bluetooth On Ear Headphones")
    );
    assert_eq!(result.get(Field::Price), Some("₹1,499.00"));
    assert_eq!(result.get(Field::Mrp), Some(""));
    assert_eq!(result.get(Field::Discount), Some(""));
    assert_eq!(
        result.get(Field::Image),
        Some("https://m.media-amazon.com/images/I/51FNnHjzhQL._SL3000_.jpg")
    );
}

#[test]
fn key_set_matches_catalog_for_any_document() {
    let catalog = load_builtin_catalog().unwrap();
    let documents = [
        String::new(),
        "<p>not a product</p>".to_string(),
        load_html_fixture("flipkart"),
        load_html_fixture("amazon"),
    ];
    for platform in PlatformId::ALL {
        let expected: Vec<Field> = catalog
            .get(platform)
            .unwrap()
            .fields
            .iter()
            .map(|f| f.field)
            .collect();
        for markup in &documents {
            let doc = Document::parse(markup);
            let result = extract(&doc, &catalog, platform).unwrap();
            assert_eq!(result.keys().collect::<Vec<_>>(), expected);
        }
    }
}

#[test]
fn cross_platform_page_yields_empty_fields() {
    let result = extract_fixture("amazon", PlatformId::Flipkart);
    // Only the generic structural fallbacks could match, and this page has none of them.
    assert_eq!(result.filled(), 0);
    assert_eq!(result.len(), 5);
}

#[test]
fn extraction_is_idempotent_on_fixtures() {
    let catalog = load_builtin_catalog().unwrap();
    for (name, platform) in [
        ("flipkart", PlatformId::Flipkart),
        ("amazon", PlatformId::Amazon),
    ] {
        let doc = Document::parse(&load_html_fixture(name));
        assert_eq!(
            extract(&doc, &catalog, platform),
            extract(&doc, &catalog, platform)
        );
    }
}

#[test]
fn highest_priority_match_wins_and_misses_are_isolated() {
    let catalog = Catalog::new(
        1,
        vec![PlatformCatalog {
            platform: PlatformId::Amazon,
            fields: vec![
                FieldSpec::new(
                    Field::Title,
                    vec![
                        Locator::css("#productTitle"),
                        Locator::css("meta[name='title']"),
                    ],
                ),
                FieldSpec::new(Field::Mrp, vec![Locator::css("#listPrice")]),
                FieldSpec::new(
                    Field::Discount,
                    vec![Locator::xpath("//span[contains(@class, 'savingsPercentage')]")],
                ),
            ],
            image: ImageRules::default(),
        }],
    )
    .unwrap();
    let doc = Document::parse(&load_html_fixture("amazon"));
    let result = extract(&doc, &catalog, PlatformId::Amazon).unwrap();

    assert!(result
        .get(Field::Title)
        .unwrap()
        .starts_with("Echo Dot (5th Gen) | Smart speaker"));
    assert_eq!(result.get(Field::Mrp), Some(""));
    assert_eq!(result.get(Field::Discount), Some("-15%"));
}

#[test]
fn platform_detection() {
    assert_eq!(
        detect_platform("https://www.flipkart.com/p/item"),
        Some(PlatformId::Flipkart)
    );
    assert_eq!(
        detect_platform("https://www.amazon.in/dp/B09B8V1LZ3"),
        Some(PlatformId::Amazon)
    );
    assert_eq!(detect_platform("https://example.org"), None);
}

#[test]
fn client_scrapes_saved_markup() {
    let client = Client::builder().build().unwrap();
    let result = client
        .scrape_html(
            &load_html_fixture("flipkart"),
            "https://www.flipkart.com/apple-iphone-15/p/itm6ac6485515ae4",
        )
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["platform"], "flipkart");
    assert_eq!(json["fields"]["price"], "₹65,999");
    assert!(json["scraped_at"].is_string());
}
