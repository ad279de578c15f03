#[cfg(test)]
mod integration_tests {
    use file_keeper::{
        parse_size, BackupMode, Behaviour, Error, ExceptionInfo, FileLoggerOptions,
        FileLoggerProvider, LogFilter, LogLevel, Logger,
    };
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    // Helper function to build options writing bare messages to `path`
    fn plain_options(path: &Path) -> FileLoggerOptions {
        FileLoggerOptions::new(path.to_string_lossy()).with_pattern("%message")
    }

    // Helper function to read log file contents
    fn read_log_file(path: &Path) -> String {
        fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Failed to read log file: {}", path.display()))
    }

    // Helper function to list the files of a log directory, sorted by name
    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn backup_options(path: &Path, mode: BackupMode) -> FileLoggerOptions {
        plain_options(path)
            .with_behaviour(Behaviour::Backup)
            .with_backup_mode(mode)
    }

    #[test]
    fn test_default_pattern_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let provider = FileLoggerProvider::new(&FileLoggerOptions::new(path.to_string_lossy())).unwrap();

        provider.create_logger("App").info("hello");
        provider.close();

        let contents = read_log_file(&path);
        let line = contents.strip_suffix('\n').unwrap();
        // "YYYY-MM-DD HH:MM:SS.fff" is 23 characters
        assert_eq!(line.len(), 23 + " [Info] App - hello".len());
        assert!(line.ends_with(" [Info] App - hello"));
        assert_eq!(&line[4..5], "-");
        assert_eq!(&line[19..20], ".");
    }

    #[test]
    fn test_pattern_tokens_and_widths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let options = FileLoggerOptions::new(path.to_string_lossy())
            .with_pattern("%LEVEL|%level|%LVL|%-6lvl|%10name|%unknown %Message");
        let provider = FileLoggerProvider::new(&options).unwrap();

        provider.create_logger("App").warn("careful");
        provider.close();

        assert_eq!(
            read_log_file(&path),
            "WARNING|Warning|WARN|Warn  |       App|%unknown careful\n"
        );
    }

    #[test]
    fn test_concurrent_producers_keep_their_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let provider = FileLoggerProvider::new(&plain_options(&path)).unwrap();

        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 500;

        let mut handles = vec![];
        for p in 0..PRODUCERS {
            let logger = provider.create_logger(&format!("producer-{p}"));
            handles.push(thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    logger.info(format!("{p} {i}"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        provider.close();

        let contents = read_log_file(&path);
        let mut next = [0usize; PRODUCERS];
        let mut total = 0;
        for line in contents.lines() {
            let mut parts = line.split(' ');
            let p: usize = parts.next().unwrap().parse().unwrap();
            let i: usize = parts.next().unwrap().parse().unwrap();
            assert_eq!(i, next[p], "producer {p} out of order");
            next[p] += 1;
            total += 1;
        }
        assert_eq!(total, PRODUCERS * PER_PRODUCER);
    }

    #[test]
    fn test_close_flushes_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let provider = FileLoggerProvider::new(&plain_options(&path)).unwrap();
        let logger = provider.create_logger("App");

        for i in 0..3000 {
            logger.info(format!("Message {i}"));
        }
        provider.close();

        let expected: Vec<String> = (0..3000).map(|i| format!("Message {i}")).collect();
        assert_eq!(read_log_file(&path).lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_logging_after_close_is_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let provider = FileLoggerProvider::new(&plain_options(&path)).unwrap();
        let logger = provider.create_logger("App");

        logger.info("queued");
        provider.close();
        logger.info("synchronous");

        // The fallback write runs on a detached thread
        let mut contents = String::new();
        for _ in 0..100 {
            contents = read_log_file(&path);
            if contents.contains("synchronous") {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(contents, "queued\nsynchronous\n");
    }

    #[test]
    fn test_size_rotation_numbers_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let options = backup_options(&path, BackupMode::SIZE).with_max_size("1k");
        let provider = FileLoggerProvider::new(&options).unwrap();
        let logger = provider.create_logger("App");

        // 100 bytes per line: the 12th and 23rd writes find the file above 1024 bytes
        for i in 0..25 {
            logger.info(format!("{i:099}"));
        }
        provider.close();

        assert_eq!(file_names(dir.path()), vec!["app.0.log", "app.1.log", "app.log"]);

        let first = read_log_file(&dir.path().join("app.0.log"));
        assert_eq!(first.len(), 1100);
        assert!(first.starts_with(&format!("{:099}\n", 0)));

        let second = read_log_file(&dir.path().join("app.1.log"));
        assert_eq!(second.len(), 1100);
        assert!(second.starts_with(&format!("{:099}\n", 11)));

        assert_eq!(read_log_file(&path).len(), 300);
    }

    #[test]
    fn test_age_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let options = backup_options(&path, BackupMode::AGE).with_max_age(Duration::from_secs(1));
        let provider = FileLoggerProvider::new(&options).unwrap();
        let logger = provider.create_logger("App");

        logger.info("old");
        thread::sleep(Duration::from_millis(2100));
        logger.info("new");
        provider.close();

        assert_eq!(read_log_file(&dir.path().join("app.0.log")), "old\n");
        assert_eq!(read_log_file(&path), "new\n");
    }

    #[test]
    fn test_append_mode_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");

        for run in 0..3 {
            let provider = FileLoggerProvider::new(&plain_options(&path)).unwrap();
            provider.create_logger("App").info(format!("run {run}"));
            provider.close();
        }

        assert_eq!(read_log_file(&path), "run 0\nrun 1\nrun 2\n");
        assert_eq!(file_names(dir.path()), vec!["app.log"]);
    }

    #[test]
    fn test_override_and_startup_backup_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");

        let overriding = plain_options(&path).with_behaviour(Behaviour::Override);
        for run in 0..2 {
            let provider = FileLoggerProvider::new(&overriding).unwrap();
            provider.create_logger("App").info(format!("override {run}"));
            provider.close();
        }
        assert_eq!(read_log_file(&path), "override 1\n");

        let startup = backup_options(&path, BackupMode::STARTUP);
        for run in 0..2 {
            let provider = FileLoggerProvider::new(&startup).unwrap();
            provider.create_logger("App").info(format!("backup {run}"));
            provider.close();
        }

        assert_eq!(read_log_file(&dir.path().join("app.0.log")), "override 1\n");
        assert_eq!(read_log_file(&dir.path().join("app.1.log")), "backup 0\n");
        assert_eq!(read_log_file(&path), "backup 1\n");
    }

    #[test]
    fn test_size_strings() {
        assert_eq!(parse_size("10M").unwrap(), 10 * (1 << 20));
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("2g").unwrap(), 2 * (1 << 30));

        let dir = tempfile::tempdir().unwrap();
        let mut config = HashMap::new();
        config.insert("path".to_string(), dir.path().join("app.log").to_string_lossy().into_owned());
        config.insert("behaviour".to_string(), "backup".to_string());
        config.insert("backup_mode".to_string(), "size".to_string());
        config.insert("max_size".to_string(), "abc".to_string());

        let options = FileLoggerOptions::from_hashmap(Some(config)).unwrap();
        assert!(matches!(
            FileLoggerProvider::new(&options),
            Err(Error::InvalidConfig { field: "max_size", .. })
        ));
    }

    #[test]
    fn test_invalid_configuration_values() {
        let cases = vec![
            HashMap::from([("behaviour".to_string(), "rotate".to_string())]),
            HashMap::from([("backup_mode".to_string(), "hourly".to_string())]),
            HashMap::from([("include_scopes".to_string(), "maybe".to_string())]),
            HashMap::from([("max_age".to_string(), "-5".to_string())]),
        ];
        for config in cases {
            assert!(FileLoggerOptions::from_hashmap(Some(config.clone())).is_err(), "{config:?}");
        }

        let dir = tempfile::tempdir().unwrap();
        let zero_age = backup_options(&dir.path().join("app.log"), BackupMode::AGE)
            .with_max_age(Duration::ZERO);
        assert!(matches!(
            FileLoggerProvider::new(&zero_age),
            Err(Error::InvalidConfig { field: "max_age", .. })
        ));
        assert!(FileLoggerProvider::new(&FileLoggerOptions::default()).is_err());
    }

    #[test]
    fn test_scopes_and_exception_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let options = FileLoggerOptions::new(path.to_string_lossy())
            .with_pattern("[%lvl] %name - %message")
            .with_include_scopes(true);
        let provider = FileLoggerProvider::new(&options).unwrap();
        let logger = provider.create_logger("Jobs");

        let exception = ExceptionInfo::new("JobError", "job 7 failed")
            .with_stack_trace("   at jobs::run")
            .with_cause(ExceptionInfo::new("IoError", "disk full"));
        {
            let _scope = logger.begin_scope("job 7");
            logger.log(LogLevel::Error, 42, "giving up", Some(&exception));
        }
        provider.close();

        assert_eq!(
            read_log_file(&path),
            "=> job 7[Fail] Jobs - giving up\n\
             [Fail] Jobs - JobError: job 7 failed\n   at jobs::run\n\
             [Fail] Jobs - IoError: disk full\n"
        );
    }

    #[test]
    fn test_reload_moves_existing_loggers() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("nested").join("second.log");
        let provider = FileLoggerProvider::new(&plain_options(&first)).unwrap();
        let a = provider.create_logger("A");
        let b = provider.create_logger("B");

        a.info("one");
        provider
            .reload(&FileLoggerOptions::new(second.to_string_lossy()).with_pattern("%name: %message"))
            .unwrap();
        a.info("two");
        b.info("three");
        provider.close();

        assert_eq!(read_log_file(&first), "one\n");
        assert_eq!(read_log_file(&second), "A: two\nB: three\n");
    }

    #[test]
    fn test_filter_and_log_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let filter: LogFilter = Arc::new(|_: &str, level: LogLevel| level >= LogLevel::Information);
        let provider = FileLoggerProvider::with_filter(&plain_options(&path), filter).unwrap();
        let logger = provider.create_logger("App");

        assert!(!logger.is_enabled(LogLevel::Debug));
        assert!(!logger.is_enabled(LogLevel::None));
        logger.debug("hidden");
        logger.trace("hidden");

        let state: PathBuf = "/srv/data".into();
        logger
            .log_state(
                LogLevel::Information,
                3,
                &state,
                None,
                Some(|p: &PathBuf, _: Option<&ExceptionInfo>| format!("opened {}", p.display())),
            )
            .unwrap();
        let missing: Option<fn(&PathBuf, Option<&ExceptionInfo>) -> String> = None;
        assert!(matches!(
            logger.log_state(LogLevel::Error, 3, &state, None, missing),
            Err(Error::MissingArgument(_))
        ));
        provider.close();

        assert_eq!(read_log_file(&path), "opened /srv/data\n");
    }
}
