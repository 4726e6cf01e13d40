use crate::types::{Doc, DocShare, DocStatus, ShareType};

/// Decides whether a share token opens the doc it points at. Drafts and
/// deleted docs are never opened.
#[must_use]
pub fn can_open(share: &DocShare, doc: &Doc, viewcode: Option<&str>) -> bool {
    if !share.is_enable || share.doc_id != doc.id {
        return false;
    }
    if matches!(doc.status, DocStatus::Draft | DocStatus::Deleted) {
        return false;
    }

    match share.share_type {
        ShareType::Open => true,
        ShareType::Code => match (share.share_value.as_deref(), viewcode) {
            (Some(expected), Some(given)) => !given.is_empty() && expected == given,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::policy::fixtures::doc;

    fn share(share_type: ShareType, value: Option<&str>, enabled: bool) -> DocShare {
        DocShare {
            doc_id: 100,
            token: "abc".to_string(),
            share_type,
            share_value: value.map(str::to_string),
            is_enable: enabled,
            create_time: Utc::now(),
        }
    }

    #[test]
    fn test_open_share() {
        let d = doc(100, 10, 1, DocStatus::Published);
        assert!(can_open(&share(ShareType::Open, None, true), &d, None));
        assert!(!can_open(&share(ShareType::Open, None, false), &d, None));
    }

    #[test]
    fn test_code_share_needs_matching_viewcode() {
        let d = doc(100, 10, 1, DocStatus::Published);
        let s = share(ShareType::Code, Some("s3cret"), true);
        assert!(can_open(&s, &d, Some("s3cret")));
        assert!(!can_open(&s, &d, Some("wrong")));
        assert!(!can_open(&s, &d, None));
    }

    #[test]
    fn test_deleted_doc_is_never_shared() {
        let d = doc(100, 10, 1, DocStatus::Deleted);
        assert!(!can_open(&share(ShareType::Open, None, true), &d, None));
    }

    #[test]
    fn test_draft_doc_is_never_shared() {
        let d = doc(100, 10, 1, DocStatus::Draft);
        assert!(!can_open(&share(ShareType::Open, None, true), &d, None));

        let coded = share(ShareType::Code, Some("s3cret"), true);
        assert!(!can_open(&coded, &d, Some("s3cret")));
    }
}
