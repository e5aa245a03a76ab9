//! # Domain models for the admin API
//!
//! Plain records as the REST API returns them. Field names follow the database
//! columns (snake_case), optional columns are `Option`, and unknown fields are
//! ignored so the client keeps working when the server adds columns.
//!
//! | Module | Types |
//! |--------|-------|
//! | [`job`] | [`Job`], [`JobStatus`], [`JobDraft`], [`JobFilter`] |
//! | [`company`] | [`Company`], [`CompanyDraft`], [`Province`], [`Category`] |
//! | [`content`] | [`Author`], [`Article`], [`ArticleStatus`], [`Scholarship`], [`ScholarshipDraft`], [`Video`] |
//! | [`people`] | [`User`], [`UserRole`], [`Contact`], [`ContactDraft`] |
//! | [`page`] | [`Page`], [`Pagination`] |

pub mod company;
pub mod content;
pub mod job;
pub mod page;
pub mod people;

pub use company::{Category, Company, CompanyDraft, Province};
pub use content::{Article, ArticleStatus, Author, Scholarship, ScholarshipDraft, Video};
pub use job::{Job, JobDraft, JobFilter, JobStatus};
pub use page::{Page, Pagination};
pub use people::{Contact, ContactDraft, User, UserRole};
