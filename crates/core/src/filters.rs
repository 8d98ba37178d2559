use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::collections::BTreeSet;

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const DEFAULT_SORT_FIELD: &str = "fechaRecepcion";
pub const DEFAULT_PORTAL_CODE: &str = "GE";
pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptionMatch {
    AnyWord,
    #[default]
    AllWords,
}

impl DescriptionMatch {
    /// Numeric code the registry expects for `descripcionTipoBusqueda`.
    pub fn registry_code(self) -> u8 {
        match self {
            Self::AnyWord => 1,
            Self::AllWords => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdministrationType {
    Central,
    Autonomous,
    Local,
    Other,
}

impl AdministrationType {
    pub fn registry_code(self) -> &'static str {
        match self {
            Self::Central => "C",
            Self::Autonomous => "A",
            Self::Local => "L",
            Self::Other => "O",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Structured registry filters extracted from one free-text query.
///
/// Every optional field is either absent or holds a validated value.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub description: Option<String>,
    pub description_search_mode: DescriptionMatch,
    pub regions: Option<BTreeSet<u32>>,
    pub administration_type: Option<AdministrationType>,
    pub beneficiary_types: Option<BTreeSet<u32>>,
    pub instruments: Option<BTreeSet<u32>>,
    pub purpose: Option<u32>,
    pub activity: Option<u32>,
    #[serde(serialize_with = "serialize_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_date")]
    pub date_to: Option<NaiveDate>,
    pub grant_call_number: Option<String>,
    pub recovery_fund_flag: Option<bool>,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub portal_code: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            description: None,
            description_search_mode: DescriptionMatch::default(),
            regions: None,
            administration_type: None,
            beneficiary_types: None,
            instruments: None,
            purpose: None,
            activity: None,
            date_from: None,
            date_to: None,
            grant_call_number: None,
            recovery_fund_flag: None,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_direction: SortDirection::default(),
            portal_code: DEFAULT_PORTAL_CODE.to_string(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterSet {
    /// True when no extractor contributed anything beyond the defaults.
    pub fn is_unconstrained(&self) -> bool {
        let defaults = Self::default();
        Self {
            sort_field: self.sort_field.clone(),
            sort_direction: self.sort_direction,
            portal_code: self.portal_code.clone(),
            page: self.page,
            page_size: self.page_size,
            description_search_mode: self.description_search_mode,
            ..defaults
        } == *self
    }

    /// Query parameters in the registry's own vocabulary; absent fields are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(description) = &self.description {
            pairs.push(("descripcion", description.clone()));
        }
        pairs.push((
            "descripcionTipoBusqueda",
            self.description_search_mode.registry_code().to_string(),
        ));
        if let Some(regions) = &self.regions {
            pairs.push(("regiones", join_ids(regions)));
        }
        if let Some(administration) = self.administration_type {
            pairs.push(("tipoAdministracion", administration.registry_code().to_string()));
        }
        if let Some(beneficiaries) = &self.beneficiary_types {
            pairs.push(("tiposBeneficiario", join_ids(beneficiaries)));
        }
        if let Some(instruments) = &self.instruments {
            pairs.push(("instrumentos", join_ids(instruments)));
        }
        if let Some(purpose) = self.purpose {
            pairs.push(("finalidad", purpose.to_string()));
        }
        if let Some(activity) = self.activity {
            pairs.push(("actividad", activity.to_string()));
        }
        if let Some(date) = self.date_from {
            pairs.push(("fechaDesde", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(date) = self.date_to {
            pairs.push(("fechaHasta", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(number) = &self.grant_call_number {
            pairs.push(("numeroConvocatoria", number.clone()));
        }
        if let Some(flag) = self.recovery_fund_flag {
            pairs.push(("mrr", flag.to_string()));
        }
        pairs.push(("order", self.sort_field.clone()));
        pairs.push(("direccion", self.sort_direction.as_str().to_string()));
        pairs.push(("vpd", self.portal_code.clone()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("pageSize", self.page_size.to_string()));

        pairs
    }

    /// Same filters pointed at another result page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

fn join_ids(ids: &BTreeSet<u32>) -> String {
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn serialize_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}
