use super::api::GraphicsApi;

/// Aborts on a pending API error, naming the failed call and its location.
#[track_caller]
pub fn check_api_error(api: &mut dyn GraphicsApi, call: &str, file: &str, line: u32) {
    if let Some(err) = api.get_error() {
        log::error!("{err} at {file}:{line}: {call}");
        panic!("{err} at {file}:{line}: {call}");
    }
}

/// Evaluates a graphics-API call and, in debug builds, checks for an error
/// afterwards. Release builds only evaluate the call.
macro_rules! check_error {
    ($api:expr, $call:expr) => {{
        let result = $call;
        if cfg!(debug_assertions) {
            $crate::gl::check::check_api_error(&mut *$api, stringify!($call), file!(), line!());
        }
        result
    }};
}

pub(crate) use check_error;

#[cfg(test)]
mod tests {
    use crate::gl::api::ApiError;
    use crate::gl::backend::RecordingApi;
    use crate::gl::GraphicsApi;

    #[test]
    fn passes_through_the_call_result() {
        let mut api = RecordingApi::new();
        let api: &mut dyn GraphicsApi = &mut api;
        let id = check_error!(api, api.gen_buffer());
        assert_eq!(id, 1);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "invalid value"))]
    fn pending_error_aborts_in_debug_builds() {
        let recording = RecordingApi::new();
        recording.inject_error(ApiError::InvalidValue);
        let mut api = recording.clone();
        let api: &mut dyn GraphicsApi = &mut api;
        check_error!(api, api.stencil_mask(0xff));
    }
}
