//! Resource IDs shared across services.

use super::{impl_resource_id_traits, ParseError, ParseResult, ResourceId, Segment};

/// `/subscriptions/{subscriptionId}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub subscription_id: String,
}

impl SubscriptionId {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }
}

impl ResourceId for SubscriptionId {
    const RESOURCE_NAME: &'static str = "Subscription";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticSubscriptions", "subscriptions"),
            Segment::subscription_id("subscriptionId"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.get_owned("subscriptionId")?,
        })
    }

    fn id(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }
}

impl_resource_id_traits!(SubscriptionId);

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group_name: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: impl Into<String>, resource_group_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
        }
    }

    /// The subscription this resource group belongs to.
    pub fn subscription(&self) -> SubscriptionId {
        SubscriptionId::new(self.subscription_id.clone())
    }
}

impl ResourceId for ResourceGroupId {
    const RESOURCE_NAME: &'static str = "Resource Group";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticSubscriptions", "subscriptions"),
            Segment::subscription_id("subscriptionId"),
            Segment::static_segment("staticResourceGroups", "resourceGroups"),
            Segment::resource_group("resourceGroupName"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.get_owned("subscriptionId")?,
            resource_group_name: result.get_owned("resourceGroupName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group_name
        )
    }
}

impl_resource_id_traits!(ResourceGroupId);

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Web/serverFarms/{serverFarmName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppServicePlanId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub server_farm_name: String,
}

impl AppServicePlanId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        server_farm_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            server_farm_name: server_farm_name.into(),
        }
    }
}

impl ResourceId for AppServicePlanId {
    const RESOURCE_NAME: &'static str = "App Service Plan";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticSubscriptions", "subscriptions"),
            Segment::subscription_id("subscriptionId"),
            Segment::static_segment("staticResourceGroups", "resourceGroups"),
            Segment::resource_group("resourceGroupName"),
            Segment::static_segment("staticProviders", "providers"),
            Segment::resource_provider("staticMicrosoftWeb", "Microsoft.Web"),
            Segment::static_segment("staticServerFarms", "serverFarms"),
            Segment::user_specified("serverFarmName"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.get_owned("subscriptionId")?,
            resource_group_name: result.get_owned("resourceGroupName")?,
            server_farm_name: result.get_owned("serverFarmName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/serverFarms/{}",
            self.subscription_id, self.resource_group_name, self.server_farm_name
        )
    }
}

impl_resource_id_traits!(AppServicePlanId);

#[cfg(test)]
mod tests {
    use super::*;

    const SUB: &str = "12345678-1234-9876-4563-123456789012";

    #[test]
    fn test_subscription_id() {
        let id = SubscriptionId::new(SUB);
        assert_eq!(id.id(), format!("/subscriptions/{}", SUB));
        assert_eq!(SubscriptionId::parse(&id.id()).unwrap(), id);
        assert!(SubscriptionId::parse("/subscriptions/").is_err());
        assert!(SubscriptionId::parse("/subscriptions").is_err());
    }

    #[test]
    fn test_subscription_id_casing() {
        let input = format!("/SUBSCRIPTIONS/{}", SUB);
        let err = SubscriptionId::parse(&input).unwrap_err();
        assert_eq!(err.segment(), Some("staticSubscriptions"));

        let id = SubscriptionId::parse_insensitively(&input).unwrap();
        assert_eq!(id, SubscriptionId::new(SUB));
        assert_eq!(id.id(), format!("/subscriptions/{}", SUB));
    }

    #[test]
    fn test_resource_group_id() {
        let id = ResourceGroupId::new(SUB, "resGroup1");
        assert_eq!(
            id.to_string(),
            format!("/subscriptions/{}/resourceGroups/resGroup1", SUB)
        );
        assert_eq!(id.subscription(), SubscriptionId::new(SUB));

        let parsed: ResourceGroupId = id.id().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_resource_group_id_missing_name() {
        let err = ResourceGroupId::parse(&format!("/subscriptions/{}/resourceGroups/", SUB))
            .unwrap_err();
        assert_eq!(err.segment(), Some("resourceGroupName"));
    }

    #[test]
    fn test_resource_group_id_casing() {
        let input = format!("/subscriptions/{}/resourcegroups/resGroup1", SUB);
        let err = ResourceGroupId::parse(&input).unwrap_err();
        assert_eq!(err.segment(), Some("staticResourceGroups"));

        let id = ResourceGroupId::parse_insensitively(&input).unwrap();
        assert_eq!(id.id(), format!("/subscriptions/{}/resourceGroups/resGroup1", SUB));
    }

    #[test]
    fn test_app_service_plan_id() {
        let id = AppServicePlanId::new(SUB, "resGroup1", "plan1");
        assert_eq!(AppServicePlanId::parse(&id.id()).unwrap(), id);

        let lowered = id.id().to_lowercase();
        assert!(AppServicePlanId::parse(&lowered).is_err());
        let normalised = AppServicePlanId::parse_insensitively(&lowered).unwrap();
        assert_eq!(normalised.server_farm_name, "plan1");
        assert_eq!(normalised.resource_group_name, "resgroup1");
        assert!(normalised.id().contains("/providers/Microsoft.Web/serverFarms/"));
    }
}
