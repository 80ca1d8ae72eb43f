use rkjm::models::{
    module_config::{ModuleConfig, PulseSignal},
    module_state::ModuleState,
    package_reference::PackageReference,
    platform::Platform,
    process_data::{JitterInputs, JitterOutputs, PDIN_DEFINITION, PDOUT_DEFINITION},
    recipe::{Recipe, SchemaVersion},
    version::{Version, VersionRange},
};
use rkjm::utils::config::ConfigParser;

#[cfg(test)]
mod version_range_tests {
    use super::*;

    fn contains(range: &str, version: &str) -> bool {
        let range: VersionRange = range.parse().unwrap();
        range.contains(&version.parse::<Version>().unwrap())
    }

    #[test]
    fn test_tilde_major() {
        assert!(contains("~5", "5.0.0"));
        assert!(contains("~5", "5.99.3"));
        assert!(!contains("~5", "6.0.0"));
        assert!(!contains("~5", "4.9.9"));
    }

    #[test]
    fn test_tilde_patch() {
        assert!(contains("~5.1.3", "5.1.3"));
        assert!(contains("~5.1.3", "5.1.9"));
        assert!(!contains("~5.1.3", "5.2.0"));
        assert!(!contains("~5.1.3", "5.1.2"));
    }

    #[test]
    fn test_caret() {
        assert!(contains("^5.0.6", "5.0.6"));
        assert!(contains("^5.0.6", "5.7.0"));
        assert!(!contains("^5.0.6", "5.0.5"));
        assert!(!contains("^5.0.6", "6.0.0"));
        assert!(contains("^0.2.1", "0.2.5"));
        assert!(!contains("^0.2.1", "0.3.0"));
    }

    #[test]
    fn test_conjunction_and_alternatives() {
        assert!(contains(">=2.0 <2.5", "2.4.9"));
        assert!(!contains(">=2.0 <2.5", "2.5"));
        assert!(contains("~2 || ~5", "5.3"));
        assert!(!contains("~2 || ~5", "4.0"));
        assert!(contains("*", "0.0.1"));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!("".parse::<VersionRange>().is_err());
        assert!("~x".parse::<VersionRange>().is_err());
        assert!(">=1 ||".parse::<VersionRange>().is_err());
    }
}

#[cfg(test)]
mod package_reference_tests {
    use super::*;

    #[test]
    fn test_parse_range_reference() {
        let reference: PackageReference = "robotkernel/[~5]@robotkernel/stable".parse().unwrap();
        assert_eq!(reference.name, "robotkernel");
        assert_eq!(reference.range.expression(), "~5");
        assert_eq!(reference.user.as_deref(), Some("robotkernel"));
        assert_eq!(reference.channel.as_deref(), Some("stable"));
        assert!(reference.is_range());
        assert_eq!(reference.to_string(), "robotkernel/[~5]@robotkernel/stable");
    }

    #[test]
    fn test_parse_pinned_reference() {
        let reference: PackageReference = "robotkernel/5.0.0".parse().unwrap();
        assert!(!reference.is_range());
        assert!(reference.range.contains(&Version::new(5, 0, 0)));
        assert!(!reference.range.contains(&Version::new(5, 0, 1)));
        assert_eq!(reference.user, None);
    }

    #[test]
    fn test_malformed_references() {
        assert!("robotkernel".parse::<PackageReference>().is_err());
        assert!("robotkernel/[~5@robotkernel/stable".parse::<PackageReference>().is_err());
        assert!("robotkernel/[~5]@robotkernel".parse::<PackageReference>().is_err());
        assert!("/[~5]".parse::<PackageReference>().is_err());
    }
}

#[cfg(test)]
mod recipe_tests {
    use super::*;

    #[test]
    fn test_new_recipe_is_latest_schema() {
        let recipe = Recipe::new("module_jitter_measurement".to_string(), String::new());
        assert_eq!(recipe.schema_version, SchemaVersion::LATEST);
        assert!(recipe.validate().is_ok());
        assert_eq!(recipe.exports.exclude, vec![".gitignore".to_string()]);
    }

    #[test]
    fn test_schema_feature_gates() {
        let one = SchemaVersion::new(1).unwrap();
        let four = SchemaVersion::new(4).unwrap();
        assert!(one.supports_prepare());
        assert!(one.supports_vcs_exclusion());
        assert!(!one.supports_base());
        assert!(!four.supports_prepare());
        assert!(!four.supports_vcs_exclusion());
        assert!(SchemaVersion::LATEST.supports_base());
        assert!(SchemaVersion::new(0).is_err());
    }

    #[test]
    fn test_base_rejected_before_schema_5() {
        let err = ConfigParser::parse_recipe(
            "schema_version = 4\nname = \"module_jitter_measurement\"\nbase = \"conan_template/[^5.0.6]@robotkernel/stable\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("base is not available"));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = ConfigParser::parse_recipe("name = \"Module Jitter\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid recipe name"));
    }
}

#[cfg(test)]
mod measurement_model_tests {
    use super::*;

    #[test]
    fn test_module_config_defaults() {
        let config = ConfigParser::parse_module_config("buffer_size: 1000\n").unwrap();
        assert_eq!(config, ModuleConfig::new(1000));
        assert_eq!(config.cps, 1);
        assert!(config.threaded);
        assert!(config.new_maxever_command.is_empty());
        assert_eq!(config.new_maxever_command_threshold, 50);
        assert!(config.needs_calibration());
        assert_eq!(config.tty_control_signals, None);
    }

    #[test]
    fn test_tty_control_config() {
        let config = ConfigParser::parse_module_config(
            "buffer_size: 100\ntty_control_signals:\n  pulse_on_trigger: rts\n  pulse_on_new_max_ever: dtr_neg\n",
        )
        .unwrap();
        let tty = config.tty_control_signals.unwrap();
        assert_eq!(tty.port, "/dev/ttyS0");
        assert_eq!(tty.pulse_on_trigger, Some(PulseSignal::Rts));
        assert_eq!(tty.pulse_on_new_max_ever, Some(PulseSignal::DtrNeg));
    }

    #[test]
    fn test_unknown_pulse_rejected() {
        assert!(ConfigParser::parse_module_config(
            "buffer_size: 100\ntty_control_signals:\n  pulse_on_trigger: cts\n"
        )
        .is_err());
        assert!("cts".parse::<PulseSignal>().is_err());
    }

    #[test]
    fn test_process_data_layout() {
        assert_eq!(PDIN_DEFINITION.lines().count(), 5);
        assert_eq!(PDOUT_DEFINITION, "uint64_t: max_ever_clamp\n");

        let inputs = JitterInputs {
            max_ever: 1,
            last_max: 2,
            last_cycle: 3,
            last_ts: 4,
            max_ever_time: 0.5,
        };
        let bytes = inputs.to_bytes();
        assert_eq!(bytes.len(), JitterInputs::SIZE);
        assert_eq!(bytes[24], 4);
        assert_eq!(&bytes[32..], &0.5f64.to_le_bytes());

        assert_eq!(JitterOutputs::from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ModuleState::SafeOp.to_string(), "<SAFEOP>");
        assert_eq!("<op>".parse::<ModuleState>().unwrap(), ModuleState::Op);
        assert_eq!(ModuleState::all().len(), 5);
    }

    #[test]
    fn test_cross_platform_detection() {
        let host = Platform::new("Linux", "x86_64");
        assert!(Platform::new("linux", "x86_64").can_run_on(&host));
        assert!(!Platform::new("Linux", "armv8").can_run_on(&host));
        assert!(!Platform::new("Macos", "x86_64").can_run_on(&host));
        assert!(Platform::new("Linux", "armv8").can_run_on(&Platform::new("linux", "aarch64")));
    }
}
