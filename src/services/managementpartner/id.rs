use crate::resourceids::{impl_resource_id_traits, ParseError, ParseResult, ResourceId, Segment};

/// `/providers/Microsoft.ManagementPartner/partners/{partnerId}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartnerId {
    pub partner_id: String,
}

impl PartnerId {
    pub fn new(partner_id: impl Into<String>) -> Self {
        Self {
            partner_id: partner_id.into(),
        }
    }
}

impl ResourceId for PartnerId {
    const RESOURCE_NAME: &'static str = "Partner";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticProviders", "providers"),
            Segment::resource_provider(
                "staticMicrosoftManagementPartner",
                "Microsoft.ManagementPartner",
            ),
            Segment::static_segment("staticPartners", "partners"),
            Segment::user_specified("partnerId"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            partner_id: result.get_owned("partnerId")?,
        })
    }

    fn id(&self) -> String {
        format!("/providers/Microsoft.ManagementPartner/partners/{}", self.partner_id)
    }
}

impl_resource_id_traits!(PartnerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_format() {
        let id = PartnerId::new("5127255");
        assert_eq!(id.id(), "/providers/Microsoft.ManagementPartner/partners/5127255");
        assert_eq!(id.to_string(), id.id());
    }

    #[test]
    fn test_parse() {
        let id =
            PartnerId::parse("/providers/Microsoft.ManagementPartner/partners/5127255").unwrap();
        assert_eq!(id.partner_id, "5127255");
        assert_eq!(PartnerId::parse(&id.id()).unwrap(), id);
    }

    #[test]
    fn test_parse_failures() {
        let cases = [
            "",
            "/providers",
            "/providers/Microsoft.ManagementPartner",
            "/providers/Microsoft.ManagementPartner/partners",
            "/providers/Microsoft.ManagementPartner/partners/",
            "/providers/Microsoft.ManagementPartner/partners/5127255/extra",
        ];
        for input in cases {
            assert!(PartnerId::parse(input).is_err(), "expected {:?} to fail", input);
        }

        let err = PartnerId::parse("/providers/Microsoft.ManagementPartner/partners/").unwrap_err();
        assert_eq!(err.segment(), Some("partnerId"));
    }

    #[test]
    fn test_parse_insensitively() {
        let input = "/PrOvIdErS/mIcRoSoFt.mAnAgEmEnTpArTnEr/pArTnErS/5127255";
        assert!(PartnerId::parse(input).is_err());

        let id = PartnerId::parse_insensitively(input).unwrap();
        assert_eq!(id, PartnerId::new("5127255"));
        assert_eq!(id.id(), "/providers/Microsoft.ManagementPartner/partners/5127255");
    }
}
