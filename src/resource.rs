//! Resource policies
//!
//! The cache-aside pipeline is written once ([`CacheManager`](crate::CacheManager),
//! [`ContentService`](crate::ContentService)) and parameterized by a small policy
//! per resource: how to build its key, which TTL and job it uses, how to fetch
//! it from the origin and how to post-process it for callers.

use std::fmt::Debug;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ContentRules;
use crate::error::{JobError, OriginError, ServiceError};
use crate::jobs::{JOB_ARG_CHAPTER, JOB_ARG_TITLE_ID, JobArgs};
use crate::keys::{self, ResourceKind, canonical_ordering};
use crate::models::{
    CatalogEntry, CatalogListResponse, CatalogPartition, Chapter, Page, PageListRequest,
    PageListResponse, SubListRequest, SubListResponse,
};
use crate::traits::OriginClient;

/// Per-resource policy of the cache-aside pipeline
pub trait Resource: Send + Sync + 'static {
    /// Identifying arguments (request fields / job arguments)
    type Args: Clone + Debug + Send + Sync + 'static;
    /// Origin response, stored verbatim in the cache
    type List: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static;
    /// What callers receive after post-processing
    type Output: Send + 'static;

    const KIND: ResourceKind;

    fn cache_key(args: &Self::Args) -> String;

    fn fetch<'a>(
        origin: &'a dyn OriginClient,
        args: &'a Self::Args,
    ) -> BoxFuture<'a, Result<Self::List, OriginError>>;

    fn item_count(list: &Self::List) -> usize;

    /// Encode `args` for a refresh job
    fn job_args(args: &Self::Args) -> JobArgs;

    /// Decode a refresh job's arguments; shape is never trusted
    ///
    /// # Errors
    ///
    /// Returns `JobError::InvalidArgument` when an argument is missing or mistyped.
    fn args_from_job(args: &JobArgs) -> Result<Self::Args, JobError>;

    /// Apply business rules to a non-empty list
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when nothing survives filtering.
    fn post_process(list: Self::List, rules: &ContentRules) -> Result<Self::Output, ServiceError>;
}

fn invalid_argument(kind: ResourceKind, argument: &'static str) -> JobError {
    JobError::InvalidArgument {
        job: kind.job_name().to_string(),
        argument,
    }
}

fn title_id_arg(kind: ResourceKind, args: &JobArgs) -> Result<String, JobError> {
    match args.get(JOB_ARG_TITLE_ID) {
        Some(Value::String(title_id)) => Ok(title_id.clone()),
        _ => Err(invalid_argument(kind, JOB_ARG_TITLE_ID)),
    }
}

/// Whole catalog, split into popular and latest entries
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Resource for Catalog {
    type Args = ();
    type List = CatalogListResponse;
    type Output = CatalogPartition;

    const KIND: ResourceKind = ResourceKind::Catalog;

    fn cache_key(_: &()) -> String {
        keys::catalog_key()
    }

    fn fetch<'a>(
        origin: &'a dyn OriginClient,
        _: &'a (),
    ) -> BoxFuture<'a, Result<CatalogListResponse, OriginError>> {
        origin.get_catalog()
    }

    fn item_count(list: &CatalogListResponse) -> usize {
        list.items.len()
    }

    fn job_args(_: &()) -> JobArgs {
        JobArgs::new()
    }

    fn args_from_job(_: &JobArgs) -> Result<(), JobError> {
        Ok(())
    }

    fn post_process(
        list: CatalogListResponse,
        rules: &ContentRules,
    ) -> Result<CatalogPartition, ServiceError> {
        let (popular, latest): (Vec<CatalogEntry>, Vec<CatalogEntry>) = list
            .items
            .into_iter()
            .map(CatalogEntry::from)
            .partition(|entry| rules.is_popular(&entry.title_id));

        Ok(CatalogPartition {
            popular: (!popular.is_empty()).then_some(popular),
            latest: (!latest.is_empty()).then_some(latest),
        })
    }
}

/// Chapter list of one catalog entry
#[derive(Debug, Clone, Copy, Default)]
pub struct SubList;

impl Resource for SubList {
    type Args = SubListRequest;
    type List = SubListResponse;
    type Output = Vec<Chapter>;

    const KIND: ResourceKind = ResourceKind::SubList;

    fn cache_key(args: &SubListRequest) -> String {
        keys::sub_list_key(&args.title_id)
    }

    fn fetch<'a>(
        origin: &'a dyn OriginClient,
        args: &'a SubListRequest,
    ) -> BoxFuture<'a, Result<SubListResponse, OriginError>> {
        origin.get_sub_list(&args.title_id)
    }

    fn item_count(list: &SubListResponse) -> usize {
        list.items.len()
    }

    fn job_args(args: &SubListRequest) -> JobArgs {
        let mut job_args = JobArgs::new();
        job_args.insert(JOB_ARG_TITLE_ID.to_string(), Value::from(args.title_id.clone()));
        job_args
    }

    fn args_from_job(args: &JobArgs) -> Result<SubListRequest, JobError> {
        title_id_arg(Self::KIND, args).map(SubListRequest::new)
    }

    fn post_process(list: SubListResponse, _: &ContentRules) -> Result<Vec<Chapter>, ServiceError> {
        Ok(list
            .items
            .into_iter()
            .map(|item| Chapter {
                number: canonical_ordering(item.number),
                title: item.title,
                title_id: item.title_id,
            })
            .collect())
    }
}

/// Pages of one chapter, with advertising pages removed
#[derive(Debug, Clone, Copy, Default)]
pub struct PageList;

impl Resource for PageList {
    type Args = PageListRequest;
    type List = PageListResponse;
    type Output = Vec<Page>;

    const KIND: ResourceKind = ResourceKind::PageList;

    fn cache_key(args: &PageListRequest) -> String {
        keys::page_list_key(&args.title_id, args.chapter)
    }

    fn fetch<'a>(
        origin: &'a dyn OriginClient,
        args: &'a PageListRequest,
    ) -> BoxFuture<'a, Result<PageListResponse, OriginError>> {
        origin.get_page_list(&args.title_id, args.chapter)
    }

    fn item_count(list: &PageListResponse) -> usize {
        list.items.len()
    }

    fn job_args(args: &PageListRequest) -> JobArgs {
        let mut job_args = JobArgs::new();
        job_args.insert(JOB_ARG_TITLE_ID.to_string(), Value::from(args.title_id.clone()));
        job_args.insert(JOB_ARG_CHAPTER.to_string(), Value::from(f64::from(args.chapter)));
        job_args
    }

    fn args_from_job(args: &JobArgs) -> Result<PageListRequest, JobError> {
        let title_id = title_id_arg(Self::KIND, args)?;
        let chapter = args
            .get(JOB_ARG_CHAPTER)
            .and_then(Value::as_f64)
            .ok_or_else(|| invalid_argument(Self::KIND, JOB_ARG_CHAPTER))?;

        #[allow(clippy::cast_possible_truncation)]
        let chapter = chapter as f32;
        Ok(PageListRequest::new(title_id, chapter))
    }

    fn post_process(list: PageListResponse, rules: &ContentRules) -> Result<Vec<Page>, ServiceError> {
        let pages: Vec<Page> = list
            .items
            .into_iter()
            .filter(|item| !rules.is_ad_url(&item.url))
            .map(|item| Page {
                image_url: item.url.replace(' ', "%20"),
            })
            .collect();

        if pages.is_empty() {
            return Err(ServiceError::not_found(Self::KIND.name()));
        }
        Ok(pages)
    }
}
