//! Boundary to an external preset generator.
//!
//! A [`PresetRequest`] pairs a free-text description with an optional
//! [`SpectralFingerprint`] and renders the prompt, system instruction and
//! response schema a text-generation service needs. The transport lives
//! behind [`PresetService`]; [`request_settings`] wraps it with the retry
//! policy and turns the response into a [`Settings`] merged over defaults.
//!
//! Returned values are not range-checked here. Callers that want that can
//! run [`Settings::validate`] before applying.

use crate::error::AssistError;
use cantor_analysis::SpectralFingerprint;
use cantor_config::Settings;
use serde_json::{Value, json};
use std::time::Duration;

/// Role the service is asked to play.
pub const SYSTEM_INSTRUCTION: &str = "You are a professional audio mixing engineer familiar \
with both Western and Middle Eastern (Maqam) music scales. You analyze audio statistics and \
apply corrective EQ and compression.";

/// What to ask the preset service for.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetRequest {
    /// Free-text description of the desired sound
    pub description: String,
    /// Measured levels of the performer's audio, if profiled
    pub fingerprint: Option<SpectralFingerprint>,
}

impl PresetRequest {
    /// A request from a description alone.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            fingerprint: None,
        }
    }

    /// Attach a fingerprint for level compensation.
    pub fn with_fingerprint(mut self, fingerprint: SpectralFingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// The user prompt.
    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "Generate a vocal mixing preset for: \"{}\". If the description implies an Arabic \
             style, suggest an appropriate Maqam (Bayati, Rast, Saba, etc) and Key. For 'Robot' \
             or 'Auto-tune' requests, set autotuneAmount high.",
            self.description
        );

        if let Some(fingerprint) = &self.fingerprint {
            let levels = serde_json::to_string(fingerprint).unwrap_or_default();
            prompt.push_str(&format!(
                "\n\nAUDIO ANALYSIS DATA (Average levels 0-255): {levels}.\n\
                 Use this data to compensate:\n\
                 - If 'RMS' is low (<50), increase inputGain.\n\
                 - If 'High' is low, boost highGain and enable airMode.\n\
                 - If 'Low' is very high, enable highPass and cut lowGain."
            ));
        }
        prompt
    }

    /// Everything a JSON-mode text service needs, as one document.
    pub fn to_document(&self) -> Value {
        json!({
            "systemInstruction": SYSTEM_INSTRUCTION,
            "prompt": self.prompt(),
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        })
    }
}

/// JSON schema of the expected response: every settings field, all required.
pub fn response_schema() -> Value {
    let number = |description: &str| json!({ "type": "number", "description": description });
    let boolean = |description: &str| json!({ "type": "boolean", "description": description });
    let string = |description: &str| json!({ "type": "string", "description": description });

    json!({
        "type": "object",
        "properties": {
            "inputGain": number("Pre-amp input gain in dB, range -12 to 12"),
            "highPass": boolean("Enable 100Hz Low Cut filter"),
            "autotuneAmount": number("Autotune/Pitch Correction amount, range 0.0 to 1.0"),
            "pitchShift": number("Pitch shift in semitones, range -12 to 12"),
            "scale": string(
                "Musical Scale/Maqam (Chromatic, Major, Minor, Bayati, Hijaz, Rast, Kurd, Saba, \
                 Sika, Ajam, Nahawand)"
            ),
            "musicalKey": string("Musical Key (C, C#, D, ... B)"),
            "lowGain": number("Low frequency EQ gain in dB, range -15 to 15"),
            "midGain": number("Mid frequency EQ gain in dB, range -15 to 15"),
            "highGain": number("High frequency EQ gain in dB, range -15 to 15"),
            "airMode": boolean("Enable 'Air' effect (12kHz High Shelf boost) for breathy vocals"),
            "compressorThreshold": number("Compressor threshold in dB, range -60 to 0"),
            "compressorRatio": number("Compressor ratio, range 1 to 20"),
            "reverbMix": number("Reverb wet/dry mix, range 0.0 to 1.0"),
            "delayMix": number("Delay/Echo wet/dry mix, range 0.0 to 1.0"),
            "delayTime": number("Delay time in seconds, range 0.0 to 1.0"),
            "delayFeedback": number("Delay feedback amount, range 0.0 to 0.9"),
            "spatial3D": boolean("Enable 3D Spatial widening effect (Dimension Expander)"),
            "outputGain": number("Master output gain multiplier, usually 0.8 to 1.2")
        },
        "required": [
            "inputGain", "highPass", "autotuneAmount", "pitchShift", "scale", "musicalKey",
            "lowGain", "midGain", "highGain", "airMode", "compressorThreshold",
            "compressorRatio", "reverbMix", "delayMix", "delayTime", "delayFeedback",
            "spatial3D", "outputGain"
        ]
    })
}

/// A failed call to the preset service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Worth retrying: network trouble, server-side 5xx.
    #[error("transient: {0}")]
    Transient(String),
    /// Not worth retrying.
    #[error("{0}")]
    Fatal(String),
}

/// Text-generation transport for preset requests.
pub trait PresetService {
    /// Raw response text, expected to be a JSON object.
    fn generate(&self, request: &PresetRequest) -> Result<String, ServiceError>;
}

/// Bounded retry with a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

/// Ask `service` for settings, retrying transient failures per `policy`.
///
/// Fatal failures and malformed responses fail at once.
pub fn request_settings<S: PresetService + ?Sized>(
    service: &S,
    request: &PresetRequest,
    policy: &RetryPolicy,
) -> Result<Settings, AssistError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match service.generate(request) {
            Ok(text) => return parse_response(&text),
            Err(ServiceError::Fatal(message)) => return Err(AssistError::Rejected(message)),
            Err(ServiceError::Transient(message)) => {
                if attempt > policy.retries {
                    tracing::error!(attempts = attempt, error = %message, "preset service failed");
                    return Err(AssistError::Exhausted {
                        attempts: attempt,
                        last: message,
                    });
                }
                tracing::warn!(
                    retry = attempt,
                    of = policy.retries,
                    error = %message,
                    "preset request failed, retrying"
                );
                std::thread::sleep(policy.delay);
            }
        }
    }
}

/// Merge a JSON object response over the default settings.
pub fn parse_response(text: &str) -> Result<Settings, AssistError> {
    if text.trim().is_empty() {
        return Err(AssistError::Malformed("empty response".into()));
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| AssistError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(AssistError::Malformed("response is not a JSON object".into()));
    }
    Settings::from_json_value(value).map_err(|e| AssistError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantor_config::Scale;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Scripted {
        replies: RefCell<VecDeque<Result<String, ServiceError>>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ServiceError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl PresetService for Scripted {
        fn generate(&self, _request: &PresetRequest) -> Result<String, ServiceError> {
            *self.calls.borrow_mut() += 1;
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::Fatal("script ran out".into())))
        }
    }

    const QUICK: RetryPolicy = RetryPolicy {
        retries: 2,
        delay: Duration::ZERO,
    };

    fn transient() -> Result<String, ServiceError> {
        Err(ServiceError::Transient("500 internal".into()))
    }

    #[test]
    fn prompt_mentions_description_and_levels_only_when_profiled() {
        let request = PresetRequest::new("dreamy ballad");
        assert!(request.prompt().contains("\"dreamy ballad\""));
        assert!(!request.prompt().contains("AUDIO ANALYSIS DATA"));

        let profiled = request.with_fingerprint(SpectralFingerprint {
            low: 10.0,
            mid: 20.0,
            high: 5.0,
            rms: 12.5,
        });
        let prompt = profiled.prompt();
        assert!(prompt.contains("AUDIO ANALYSIS DATA (Average levels 0-255)"));
        assert!(prompt.contains("\"rms\":12.5"));
        assert!(prompt.contains("enable highPass and cut lowGain"));
    }

    #[test]
    fn schema_requires_every_field() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(required.len(), 18);
        assert_eq!(properties.len(), 18);
        for name in required {
            assert!(properties.contains_key(name.as_str().unwrap()), "{name}");
        }

        let defaults = serde_json::to_value(Settings::default()).unwrap();
        for key in defaults.as_object().unwrap().keys() {
            assert!(properties.contains_key(key), "schema lacks {key}");
        }
    }

    #[test]
    fn partial_response_merges_over_defaults() {
        let service = Scripted::new(vec![Ok(r#"{"pitchShift": 3, "scale": "Hijaz"}"#.into())]);
        let settings = request_settings(&service, &PresetRequest::new("x"), &QUICK).unwrap();
        assert_eq!(settings.pitch_shift, 3.0);
        assert_eq!(settings.scale, Scale::Hijaz);
        assert_eq!(settings.reverb_mix, Settings::default().reverb_mix);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let service = Scripted::new(vec![Ok(r#"{"outputGain": 7.0}"#.into())]);
        let settings = request_settings(&service, &PresetRequest::new("x"), &QUICK).unwrap();
        assert_eq!(settings.output_gain, 7.0);
    }

    #[test]
    fn transient_failures_retry_then_succeed() {
        let service = Scripted::new(vec![transient(), transient(), Ok("{}".into())]);
        let settings = request_settings(&service, &PresetRequest::new("x"), &QUICK).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(service.calls(), 3);
    }

    #[test]
    fn transient_failures_exhaust_after_two_retries() {
        let service = Scripted::new(vec![transient(), transient(), transient(), Ok("{}".into())]);
        let err = request_settings(&service, &PresetRequest::new("x"), &QUICK).unwrap_err();
        assert!(matches!(err, AssistError::Exhausted { attempts: 3, .. }), "{err:?}");
        assert_eq!(service.calls(), 3);
    }

    #[test]
    fn fatal_and_malformed_do_not_retry() {
        let service = Scripted::new(vec![Err(ServiceError::Fatal("quota".into()))]);
        let err = request_settings(&service, &PresetRequest::new("x"), &QUICK).unwrap_err();
        assert!(matches!(err, AssistError::Rejected(_)));
        assert_eq!(service.calls(), 1);

        let service = Scripted::new(vec![Ok("not json".into()), Ok("{}".into())]);
        let err = request_settings(&service, &PresetRequest::new("x"), &QUICK).unwrap_err();
        assert!(matches!(err, AssistError::Malformed(_)));
        assert_eq!(service.calls(), 1);
    }

    #[test]
    fn non_object_and_empty_responses_are_malformed() {
        assert!(matches!(parse_response("[1, 2]"), Err(AssistError::Malformed(_))));
        assert!(matches!(parse_response("  "), Err(AssistError::Malformed(_))));
        assert!(matches!(
            parse_response(r#"{"scale": "Dorian"}"#),
            Err(AssistError::Malformed(_))
        ));
    }

    #[test]
    fn default_policy_is_two_retries_one_second_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
