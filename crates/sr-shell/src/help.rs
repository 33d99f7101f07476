pub fn help_message(version: &str) -> String {
    format!(
        "Basic commands:
    error([message, ...])        print the messages on the standard error.
    exit([code])                 leave the shell with the given code, 0 when omitted.
    getFromEnvironment(name)     value of the environment variable `name`, or null.
    help()                       this text.
    importExtension(name, ...)   load the named extensions once, `a.b` is `a/b.rhai`.
    load(file, ...)              run the script files in this shell after the current
                                 statement.
    print([message, ...])        print the messages on the standard output.
    quit()                       leave the shell with code 0.
    read([message, ...])         print the messages and read one line of input,
                                 null at end of input.
    readFile(name)               whole content of a file.
    runCommand(command, [arg, ...], [options])
    runCommand(options)          run a process and return its exit status.

Read-only properties:
    arguments                    arguments given after the script on the command line.
    availableExtensions          extensions found on the extension path.
    importedExtensions           extensions imported so far.
    runtimeVersion               version of the script runtime.
    srVersion, version           version of the shell, {version}.

All of the above are also reachable as members of `sr.engine`.

runCommand options:
    Every argument before a trailing object is converted to a string; the first
    one names the command. A trailing object holds the options:
    args       array of extra arguments.
    env        object whose properties are added to the process environment.
    input      string written to the process standard input.
    output     when present, the process standard output is appended to it.
    err        when present, the process standard error is appended to it.
    command    command name, used when none is passed as an argument.
    result     when present, receives the exit status.
    The status is -2 when the process cannot be started and -1 when it was
    killed by a signal.",
        version = version
    )
}

#[cfg(test)]
mod help_tests {
    use super::*;

    #[test]
    fn help_names_every_command_and_the_version() {
        let text = help_message("9.9.9");
        for command in [
            "error(", "exit(", "getFromEnvironment(", "help(", "importExtension(", "load(",
            "print(", "quit(", "read(", "readFile(", "runCommand(",
        ] {
            assert!(text.contains(command), "missing {}", command);
        }
        assert!(text.contains("9.9.9"));
    }
}
