use crate::enums::string_enum;

string_enum! {
    /// The pricing tier of an IoT Central application.
    pub enum AppSku {
        St0 => "ST0",
        St1 => "ST1",
        St2 => "ST2",
    }
}

string_enum! {
    pub enum AppState {
        Created => "created",
        Suspended => "suspended",
    }
}

string_enum! {
    pub enum ProvisioningState {
        Canceled => "Canceled",
        Creating => "Creating",
        Deleting => "Deleting",
        Failed => "Failed",
        Succeeded => "Succeeded",
        Updating => "Updating",
    }
}

string_enum! {
    pub enum PublicNetworkAccess {
        Disabled => "Disabled",
        Enabled => "Enabled",
    }
}

string_enum! {
    pub enum SystemAssignedServiceIdentityType {
        None => "None",
        SystemAssigned => "SystemAssigned",
    }
}

impl PublicNetworkAccess {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() {
        assert_eq!(AppSku::parse("st1"), AppSku::St1);
        assert_eq!(AppSku::parse("ST1"), AppSku::St1);
        assert_eq!(AppSku::St2.as_str(), "ST2");
        assert_eq!(AppSku::parse("ST9").as_str(), "ST9");
    }

    #[test]
    fn test_state_is_lowercase_on_the_wire() {
        assert_eq!(AppState::parse("Suspended"), AppState::Suspended);
        assert_eq!(serde_json::to_string(&AppState::Created).unwrap(), "\"created\"");
    }

    #[test]
    fn test_public_network_access() {
        assert_eq!(PublicNetworkAccess::from_enabled(true), PublicNetworkAccess::Enabled);
        assert_eq!(PublicNetworkAccess::from_enabled(false), PublicNetworkAccess::Disabled);
        assert_eq!(ProvisioningState::parse("SUCCEEDED"), ProvisioningState::Succeeded);
    }
}
