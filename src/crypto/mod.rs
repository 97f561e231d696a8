pub mod certificates;


pub use certificates::{
    load_certificate, BayInfo, CertificateIssuer, DeviceCertInfo, WipeCertificate, WipeDetails,
};
