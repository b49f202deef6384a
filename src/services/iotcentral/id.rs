use crate::resourceids::{
    impl_resource_id_traits, ParseError, ParseResult, ResourceGroupId, ResourceId, Segment,
};

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.IoTCentral/IoTApps/{iotAppName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IoTAppId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub iot_app_name: String,
}

impl IoTAppId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        iot_app_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            iot_app_name: iot_app_name.into(),
        }
    }

    pub fn resource_group(&self) -> ResourceGroupId {
        ResourceGroupId::new(self.subscription_id.clone(), self.resource_group_name.clone())
    }
}

impl ResourceId for IoTAppId {
    const RESOURCE_NAME: &'static str = "IoT App";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticSubscriptions", "subscriptions"),
            Segment::subscription_id("subscriptionId"),
            Segment::static_segment("staticResourceGroups", "resourceGroups"),
            Segment::resource_group("resourceGroupName"),
            Segment::static_segment("staticProviders", "providers"),
            Segment::resource_provider("staticMicrosoftIoTCentral", "Microsoft.IoTCentral"),
            Segment::static_segment("staticIoTApps", "IoTApps"),
            Segment::user_specified("iotAppName"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.get_owned("subscriptionId")?,
            resource_group_name: result.get_owned("resourceGroupName")?,
            iot_app_name: result.get_owned("iotAppName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.IoTCentral/IoTApps/{}",
            self.subscription_id, self.resource_group_name, self.iot_app_name
        )
    }
}

impl_resource_id_traits!(IoTAppId);
