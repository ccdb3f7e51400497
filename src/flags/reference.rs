//! External references: fully-qualified parameter ARNs such as
//! `arn:aws:ssm:us-east-1:123456789012:parameter/feature-flags/ui/DARK_MODE`.

use super::FlagError;

/// Resolve an external reference to the store key it names. The key must sit
/// strictly below `root`.
pub fn resolve(reference: &str, root: &str) -> Result<String, FlagError> {
    let invalid = |why: &str| FlagError::InvalidReference(format!("{}: {}", why, reference));

    let parts: Vec<&str> = reference.trim().splitn(6, ':').collect();
    let [scheme, partition, service, _region, _account, resource] = parts[..] else {
        return Err(invalid("not a parameter ARN"));
    };
    if scheme != "arn" || partition.is_empty() || service != "ssm" {
        return Err(invalid("not a parameter ARN"));
    }

    let name = resource
        .strip_prefix("parameter/")
        .ok_or_else(|| invalid("not a parameter resource"))?;
    let name = format!("/{}", name.trim_start_matches('/'));

    let root = root.trim_end_matches('/');
    let Some(rest) = name.strip_prefix(root).and_then(|r| r.strip_prefix('/')) else {
        return Err(invalid("outside the flags namespace"));
    };
    if rest.is_empty() || rest.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return Err(invalid("malformed parameter name"));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/feature-flags";

    #[test]
    fn resolves_flag_arns() {
        assert_eq!(
            resolve("arn:aws:ssm:us-east-1:123456789012:parameter/feature-flags/ui/DARK_MODE", ROOT).unwrap(),
            "/feature-flags/ui/DARK_MODE"
        );
        assert_eq!(
            resolve("arn:aws-us-gov:ssm:us-gov-west-1:1:parameter/feature-flags/X", ROOT).unwrap(),
            "/feature-flags/X"
        );
    }

    #[test]
    fn rejects_foreign_references() {
        for reference in [
            "arn:aws:ssm:us-east-1:1:parameter/other/X",
            "arn:aws:ssm:us-east-1:1:parameter/feature-flags",
            "arn:aws:ssm:us-east-1:1:parameter/feature-flags-extra/X",
            "arn:aws:ssm:us-east-1:1:parameter/feature-flags/../secrets",
            "arn:aws:s3:::bucket/feature-flags/X",
            "arn:aws:ssm:us-east-1:1:document/feature-flags/X",
            "/feature-flags/X",
        ] {
            assert!(
                matches!(resolve(reference, ROOT), Err(FlagError::InvalidReference(_))),
                "accepted {}",
                reference
            );
        }
    }
}
