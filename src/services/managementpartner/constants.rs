use crate::enums::string_enum;

string_enum! {
    /// Whether a partner association is in effect.
    pub enum ManagementPartnerState {
        Active => "Active",
        Deleted => "Deleted",
    }
}
