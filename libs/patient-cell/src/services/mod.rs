pub mod profile;

pub use profile::PatientProfileService;
