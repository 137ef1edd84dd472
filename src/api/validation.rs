use super::ApiError;
use crate::domain::ImageId;

const MAX_PAGE: u64 = 1_000_000;

pub fn validate_page(page: Option<u64>) -> Result<u64, ApiError> {
    let page = page.unwrap_or(1);
    if !(1..=MAX_PAGE).contains(&page) {
        return Err(ApiError::validation(format!(
            "Invalid page: {}. Page must be between 1 and {}",
            page, MAX_PAGE
        )));
    }
    Ok(page)
}

pub fn parse_image_id(raw: &str) -> Result<ImageId, ApiError> {
    raw.parse::<ImageId>()
        .ok()
        .filter(|id| id.value() > 0)
        .ok_or_else(|| ApiError::validation(format!("Invalid image id: '{}'", raw)))
}

/// Splits the `label,image_id` value of the result form. The id follows the
/// last comma so labels may themselves contain commas.
pub fn split_label_option(option: &str) -> Result<(&str, ImageId), ApiError> {
    let (label, id) = option
        .rsplit_once(',')
        .ok_or_else(|| ApiError::validation("Expected '<label>,<image id>'"))?;

    Ok((label, parse_image_id(id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(None).unwrap(), 1);
        assert_eq!(validate_page(Some(3)).unwrap(), 3);
        assert!(validate_page(Some(0)).is_err());
    }

    #[test]
    fn test_parse_image_id() {
        assert_eq!(parse_image_id(" 12 ").unwrap(), ImageId::new(12));
        assert!(parse_image_id("0").is_err());
        assert!(parse_image_id("abc").is_err());
    }

    #[test]
    fn test_split_label_option() {
        let (label, id) = split_label_option("dog,7").unwrap();
        assert_eq!((label, id), ("dog", ImageId::new(7)));

        let (label, id) = split_label_option("hot dog, bun,42").unwrap();
        assert_eq!((label, id), ("hot dog, bun", ImageId::new(42)));

        assert!(split_label_option("dog").is_err());
        assert!(split_label_option("dog,x").is_err());
    }
}
