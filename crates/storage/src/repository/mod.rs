pub mod lead;

pub use lead::LeadRepository;
