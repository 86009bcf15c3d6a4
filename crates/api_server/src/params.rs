//! Query-string parsing
//!
//! Pairs are taken raw so `select` can repeat. Unknown keys are ignored;
//! empty values fall back to the configured defaults.

use chrono::NaiveDate;
use contracts::{
    AggregationMode, ContractError, ExportLayout, QueryDefaults, QueryParams,
    SelectionSet, VehicleKey,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_PAGE_SIZE: usize = 50;

/// Everything a metrics endpoint may ask for
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub query: QueryParams,
    pub mode: AggregationMode,
    pub selected: SelectionSet,
    pub page: usize,
    pub page_size: usize,
    pub layout: ExportLayout,
}

impl RequestParams {
    /// Parse query-string pairs on top of `defaults`
    ///
    /// Missing `to` is `today`; missing `from` is three months before `to`.
    pub fn parse(
        pairs: &[(String, String)],
        defaults: &QueryDefaults,
        today: NaiveDate,
    ) -> Result<Self, ContractError> {
        let mut query = defaults.clone();
        let mut mode = AggregationMode::default();
        let mut selected = SelectionSet::new();
        let mut page = 1;
        let mut page_size = DEFAULT_PAGE_SIZE;
        let mut layout = ExportLayout::default();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "metric" => query.metric = value.parse()?,
                "scope" => query.scope = value.parse()?,
                "group_id" => query.group_id = Some(value.to_string()),
                "granularity" => query.granularity = value.parse()?,
                "from" => query.from = Some(parse_date("from", value)?),
                "to" => query.to = Some(parse_date("to", value)?),
                "mode" => mode = value.parse()?,
                "select" => {
                    selected.insert(VehicleKey::parse_selector(value)?);
                }
                "page" => page = parse_number("page", value)?,
                "page_size" => page_size = parse_number("page_size", value)?,
                "format" => layout = value.parse()?,
                _ => {}
            }
        }

        Ok(Self {
            query: query.to_params(today),
            mode,
            selected,
            page,
            page_size,
            layout,
        })
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ContractError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        ContractError::config_validation(field, format!("expected YYYY-MM-DD, got '{value}': {e}"))
    })
}

fn parse_number(field: &str, value: &str) -> Result<usize, ContractError> {
    value.parse().map_err(|_| {
        ContractError::config_validation(field, format!("expected a positive integer, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Granularity, Metric, Scope};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
    }

    #[test]
    fn test_defaults_apply() {
        let params = RequestParams::parse(&[], &QueryDefaults::default(), today()).unwrap();
        assert_eq!(params.query.metric, Metric::Distance);
        assert_eq!(params.query.scope, Scope::Fleet);
        assert_eq!(params.query.to, today());
        assert_eq!(params.query.from, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(params.layout, ExportLayout::Flat);
        assert!(params.selected.is_empty());
    }

    #[test]
    fn test_full_query_string() {
        let input = pairs(&[
            ("metric", "fuel"),
            ("scope", "group"),
            ("group_id", "g2"),
            ("granularity", "monthly"),
            ("from", "2024-01-01"),
            ("to", "2024-03-31"),
            ("mode", "average"),
            ("select", "Truck|G9-1"),
            ("select", "Van | 2|G9-2"),
            ("page", "3"),
            ("page_size", "25"),
            ("format", "pivot"),
            ("unknown", "ignored"),
        ]);
        let params = RequestParams::parse(&input, &QueryDefaults::default(), today()).unwrap();

        assert_eq!(params.query.metric, Metric::Fuel);
        assert_eq!(params.query.scope, Scope::Group);
        assert_eq!(params.query.group_id.as_deref(), Some("g2"));
        assert_eq!(params.query.granularity, Granularity::Monthly);
        assert_eq!(params.query.from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(params.mode, AggregationMode::Average);
        assert!(params.selected.contains(&VehicleKey::new("Van | 2", "G9-2")));
        assert_eq!(params.selected.len(), 2);
        assert_eq!((params.page, params.page_size), (3, 25));
        assert_eq!(params.layout, ExportLayout::Pivot);
    }

    #[test]
    fn test_from_defaults_relative_to_explicit_to() {
        let input = pairs(&[("to", "2024-03-15")]);
        let params = RequestParams::parse(&input, &QueryDefaults::default(), today()).unwrap();
        assert_eq!(params.query.from, NaiveDate::from_ymd_opt(2023, 12, 15).unwrap());
    }

    #[test]
    fn test_empty_values_ignored() {
        let input = pairs(&[("from", ""), ("group_id", "  ")]);
        let params = RequestParams::parse(&input, &QueryDefaults::default(), today()).unwrap();
        assert_eq!(params.query.to, today());
        assert_eq!(params.query.group_id, None);
    }

    #[test]
    fn test_invalid_values() {
        let defaults = QueryDefaults::default();
        for input in [
            pairs(&[("from", "01/02/2024")]),
            pairs(&[("granularity", "weekly")]),
            pairs(&[("page", "-1")]),
            pairs(&[("select", "no-separator")]),
            pairs(&[("format", "xlsx")]),
        ] {
            let err = RequestParams::parse(&input, &defaults, today()).unwrap_err();
            assert!(
                matches!(err, ContractError::ConfigValidation { .. }),
                "unexpected error for {input:?}: {err}"
            );
        }
    }
}
