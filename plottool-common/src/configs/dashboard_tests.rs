#[cfg(test)]
mod tests {
    use crate::configs::{
        color::Color,
        dashboard::{Config, Fullscreen},
        reader::YamlConfig,
        validation::Validatable,
    };
    use std::time::Duration;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let s = "
charts:
    - name: CPU local
      kind: cpu
";
        let config: Config = YamlConfig::parse_valid(s).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.fullscreen(), Fullscreen::Off);
        assert!(!config.fps_counter());
        assert!(config.log_config().is_none());
        assert_eq!(config.default_width(), 80);
        assert_eq!(config.default_height(), 8);
        assert_eq!(config.charts().len(), 1);
        let chart = &config.charts()[0];
        assert_eq!(chart.target(), "");
        assert_eq!(chart.max_scale(), 0.0);
        assert_eq!(config.buffer_capacity(chart), 78);
    }

    #[test]
    fn test_full_config() {
        let s = "
log_config: config-examples/logger.yaml
refresh_interval: 500ms
max_fps: 20
default_width: 120
default_height: 10
window_margin: 2
chart_spacing: 0
fullscreen: force
fps_counter: true
background_color: '#101010'
border_color: '#202020'
text_color: '#e0e0e0'
error_line_color: '#ff0000'
charts:
    - name: eth0 on local
      kind: if_thr
      target: local,eth0
      refresh_interval: 2s
      width: 50
      max_scale: 125000000
      line_color: '#00ff00'
      line_color_secondary: '#0000ff'
    - name: ping gw
      kind: ping
      target: 192.168.0.1
";
        let config: Config = YamlConfig::parse_valid(s).unwrap();
        assert_eq!(config.log_config(), Some("config-examples/logger.yaml"));
        assert_eq!(config.refresh_interval(), Duration::from_millis(500));
        assert_eq!(config.frame_interval(), Duration::from_millis(50));
        assert_eq!(config.fullscreen(), Fullscreen::Force);
        assert!(config.fps_counter());
        assert_eq!(config.error_line_color(), Color::rgb(255, 0, 0));

        let net = &config.charts()[0];
        assert_eq!(net.kind(), "if_thr");
        assert_eq!(net.refresh_interval(config.refresh_interval()), Duration::from_secs(2));
        assert_eq!(config.buffer_capacity(net), 48);
        assert_eq!(net.line_color_secondary(), Color::rgb(0, 0, 255));

        let ping = &config.charts()[1];
        assert_eq!(
            ping.refresh_interval(config.refresh_interval()),
            Duration::from_millis(500)
        );
        assert_eq!(config.buffer_capacity(ping), 118);
    }

    #[test]
    fn test_zero_chart_interval_falls_back_to_global() {
        let s = "
refresh_interval: 3s
charts:
    - name: mem
      kind: memory
      refresh_interval: 0s
";
        let config: Config = YamlConfig::parse_valid(s).unwrap();
        let chart = &config.charts()[0];
        assert_eq!(
            chart.refresh_interval(config.refresh_interval()),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_chart_kind_is_missing() {
        let s = "
charts:
    - name: mem
";
        assert!(YamlConfig::parse::<Config>(s).is_err());
    }

    #[test]
    fn test_malformed_color_is_rejected() {
        let s = "
charts:
    - name: mem
      kind: memory
      line_color: green
";
        assert!(YamlConfig::parse::<Config>(s).is_err());
    }

    #[test]
    fn test_unknown_fullscreen_mode_is_rejected() {
        let s = "
fullscreen: sometimes
charts:
    - name: mem
      kind: memory
";
        assert!(YamlConfig::parse::<Config>(s).is_err());
    }

    #[test]
    fn test_invalid_global_interval() {
        let s = "
refresh_interval: often
charts:
    - name: mem
      kind: memory
";
        let config: Config = YamlConfig::parse(s).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_fps() {
        let s = "
max_fps: 0
charts:
    - name: mem
      kind: memory
";
        let config: Config = YamlConfig::parse(s).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_too_small_geometry() {
        let s = "
default_width: 2
charts:
    - name: mem
      kind: memory
";
        let config: Config = YamlConfig::parse(s).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_charts() {
        let s = "
charts: []
";
        let config: Config = YamlConfig::parse(s).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chart_errors_are_aggregated() {
        let s = "
charts:
    - name: mem
      kind: memory
      refresh_interval: soon
    - name: cpu
      kind: cpu
      width: 1
    - name: ok
      kind: cpu
";
        let config: Config = YamlConfig::parse(s).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("'mem'"), "{}", err);
        assert!(err.contains("'cpu'"), "{}", err);
        assert!(!err.contains("'ok'"), "{}", err);
    }

    #[test]
    fn test_negative_max_scale() {
        let s = "
charts:
    - name: mem
      kind: memory
      max_scale: -1
";
        let config: Config = YamlConfig::parse(s).unwrap();
        assert!(config.validate().is_err());
    }
}
