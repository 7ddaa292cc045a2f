use radeon_drm::{DriDevice, DrmError, RadeonDevice};

#[test]
fn open_missing_node_reports_path() {
    let err = DriDevice::open("/dev/dri/card-does-not-exist".as_ref()).unwrap_err();
    match err {
        DrmError::Open { path, source } => {
            assert_eq!(path, "/dev/dri/card-does-not-exist");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn radeon_open_missing_node_fails_before_probing() {
    let err = RadeonDevice::open("/dev/dri/card-does-not-exist").unwrap_err();
    assert!(matches!(err, DrmError::Open { .. }), "got: {err}");
}

#[test]
fn errors_render_the_failing_operation() {
    let err = DrmError::Ioctl {
        request: "DRM_IOCTL_RADEON_CS",
        source: std::io::Error::from_raw_os_error(libc::EINVAL),
    };
    let msg = err.to_string();
    assert!(msg.starts_with("DRM_IOCTL_RADEON_CS: "), "got: {msg}");
}
