//! Resource services.
//!
//! Each service is a borrowed view over a `Client` (`client.tags()`, ...)
//! that builds paths and bodies for one resource family and hands them to the
//! shared pipeline. Services hold no state of their own.

mod contact_fields;
mod contacts;
mod countries;
mod genders;
mod tags;

pub use contact_fields::{
    ContactField, ContactFieldInput, ContactFieldType, ContactFieldTypesService, ContactFieldsService,
};
pub use contacts::{Career, Contact, ContactInformation, ContactInput, ContactSearchListOptions, ContactsService};
pub use countries::{CountriesService, Country};
pub use genders::{Gender, GenderInput, GendersService};
pub use tags::{Tag, TagInput, TagsService};
