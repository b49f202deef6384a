use crate::resourceids::{
    impl_resource_id_traits, ParseError, ParseResult, ResourceGroupId, ResourceId, Segment,
};

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.ContainerService/managedClusters/{managedClusterName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KubernetesClusterId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub managed_cluster_name: String,
}

impl KubernetesClusterId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        managed_cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            managed_cluster_name: managed_cluster_name.into(),
        }
    }

    pub fn resource_group(&self) -> ResourceGroupId {
        ResourceGroupId::new(self.subscription_id.clone(), self.resource_group_name.clone())
    }
}

impl ResourceId for KubernetesClusterId {
    const RESOURCE_NAME: &'static str = "Kubernetes Cluster";

    fn segments() -> Vec<Segment> {
        vec![
            Segment::static_segment("staticSubscriptions", "subscriptions"),
            Segment::subscription_id("subscriptionId"),
            Segment::static_segment("staticResourceGroups", "resourceGroups"),
            Segment::resource_group("resourceGroupName"),
            Segment::static_segment("staticProviders", "providers"),
            Segment::resource_provider(
                "staticMicrosoftContainerService",
                "Microsoft.ContainerService",
            ),
            Segment::static_segment("staticManagedClusters", "managedClusters"),
            Segment::user_specified("managedClusterName"),
        ]
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.get_owned("subscriptionId")?,
            resource_group_name: result.get_owned("resourceGroupName")?,
            managed_cluster_name: result.get_owned("managedClusterName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerService/managedClusters/{}",
            self.subscription_id, self.resource_group_name, self.managed_cluster_name
        )
    }
}

impl_resource_id_traits!(KubernetesClusterId);
