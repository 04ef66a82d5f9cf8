use serde::Serialize;

pub const PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub image_url: String,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub page: usize,
    pub total_pages: usize,
}

/// Read-only product listing served in fixed-size pages.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        let prices = [100, 120, 90, 150, 200, 75, 180, 210, 95, 110];
        let products = prices
            .iter()
            .zip(1u32..)
            .map(|(&price, id)| Product {
                id,
                name: format!("Product {id}"),
                image_url: format!("/images/prod{id}.jpg"),
                price,
            })
            .collect();
        Self::new(products)
    }
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn total_pages(&self) -> usize {
        self.products.len().div_ceil(PAGE_SIZE).max(1)
    }

    /// Returns the requested page, clamped into range. Anything that does not
    /// start with a number asks for page 1.
    pub fn page(&self, requested: Option<&str>) -> CatalogPage {
        let total_pages = self.total_pages();
        let requested = requested.and_then(leading_integer).unwrap_or(1);
        let page = requested.clamp(1, total_pages as i64) as usize;

        let start = (page - 1) * PAGE_SIZE;
        let products = self.products.iter().skip(start).take(PAGE_SIZE).cloned().collect();

        CatalogPage {
            products,
            page,
            total_pages,
        }
    }
}

/// `"3"` → 3, `" 2abc"` → 2, `"-4"` → -4, `"abc"` → None.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    // Overlong numbers saturate instead of wrapping.
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_is_full() {
        let page = Catalog::default().page(None);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.products.len(), 6);
        assert_eq!(page.products[0].name, "Product 1");
        assert_eq!(page.products[0].price, 100);
    }

    #[test]
    fn last_page_holds_the_rest() {
        let page = Catalog::default().page(Some("2"));
        assert_eq!(page.page, 2);
        let ids: Vec<u32> = page.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![7, 8, 9, 10]);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let catalog = Catalog::default();
        assert_eq!(catalog.page(Some("0")).page, 1);
        assert_eq!(catalog.page(Some("-3")).page, 1);
        assert_eq!(catalog.page(Some("99")).page, 2);
        assert_eq!(catalog.page(Some("99999999999999999999999")).page, 2);
    }

    #[test]
    fn garbage_asks_for_the_first_page() {
        let catalog = Catalog::default();
        assert_eq!(catalog.page(Some("abc")).page, 1);
        assert_eq!(catalog.page(Some("")).page, 1);
        assert_eq!(catalog.page(Some("2nd")).page, 2);
    }

    #[test]
    fn empty_catalog_still_has_one_page() {
        let page = Catalog::new(Vec::new()).page(Some("5"));
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.products.is_empty());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(Catalog::default().page(Some("2"))).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["products"][0]["imageUrl"], "/images/prod7.jpg");
    }
}
