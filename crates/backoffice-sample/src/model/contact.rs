use backoffice::Schema;

pub const CONTACTS: &str = "contacts";

pub fn contact_schema() -> Schema {
    Schema::new("Contact", CONTACTS)
        .required("name")
        .required("email")
        .field("phone")
}
