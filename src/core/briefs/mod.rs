pub mod brief_service;

pub use brief_service::{
    document_link, extract_document_id, BriefError, BriefOutcome, BriefRequest, BriefService,
};
