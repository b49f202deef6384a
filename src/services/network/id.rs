use crate::resourceids::{impl_resource_id_traits, ParseError, ParseResult, ResourceId, Segment};

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/applicationGateways/{applicationGatewayName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationGatewayId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub application_gateway_name: String,
}

impl ApplicationGatewayId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        application_gateway_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            application_gateway_name: application_gateway_name.into(),
        }
    }
}

impl ResourceId for ApplicationGatewayId {
    const RESOURCE_NAME: &'static str = "Application Gateway";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticSubscriptions", "subscriptions"),
            Segment::subscription_id("subscriptionId"),
            Segment::static_segment("staticResourceGroups", "resourceGroups"),
            Segment::resource_group("resourceGroupName"),
            Segment::static_segment("staticProviders", "providers"),
            Segment::resource_provider("staticMicrosoftNetwork", "Microsoft.Network"),
            Segment::static_segment("staticApplicationGateways", "applicationGateways"),
            Segment::user_specified("applicationGatewayName"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.get_owned("subscriptionId")?,
            resource_group_name: result.get_owned("resourceGroupName")?,
            application_gateway_name: result.get_owned("applicationGatewayName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/applicationGateways/{}",
            self.subscription_id, self.resource_group_name, self.application_gateway_name
        )
    }
}

impl_resource_id_traits!(ApplicationGatewayId);
