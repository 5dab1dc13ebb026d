use crate::engine::config::ClusterConfig;
use crate::engine::resources::ResourcePlan;
use std::fmt::Write;

/// Engine input and output paths, resolved by the scheduler from the job name.
const JOB_INPUT: &str = "${JOB_NAME%.*}.gjf";
const JOB_OUTPUT: &str = "out/${JOB_NAME%.*}.out";

/// Renders the SGE submission script for one conformer.
///
/// The memory request is the engine allocation from `plan` plus the configured
/// headroom.
pub fn render_cluster_script(
    plan: &ResourcePlan,
    conformer_name: &str,
    wall_time: &str,
    cluster: &ClusterConfig,
) -> String {
    let file_name = format!("{conformer_name}.sh");
    let invocation = format!(
        "/usr/bin/time -v {} < {JOB_INPUT} > {JOB_OUTPUT}",
        cluster.engine_command
    );

    let mut s = String::new();
    let _ = writeln!(s, "### {file_name} START ###");
    s.push_str("#!/bin/bash\n");
    s.push_str("#$ -cwd\n");
    s.push_str("#$ -o logs/$JOB_ID.$JOB_NAME.joblog\n");
    s.push_str("#$ -j y\n");
    s.push_str("#$ -M $USER@mail\n");
    s.push_str("#$ -m bea\n");
    let _ = writeln!(
        s,
        "#$ -l h_data={}G,h_rt={},arch={}",
        plan.memory_gb() + cluster.memory_headroom,
        wall_time,
        cluster.architecture
    );
    let _ = writeln!(s, "#$ -pe shared {}", plan.processors());
    s.push('\n');

    s.push_str("# echo job info on joblog:\n");
    s.push_str("echo \"Job $JOB_ID started on:   \" `hostname -s`\n");
    s.push_str("echo \"Job $JOB_ID started on:   \" `date `\n");
    s.push_str("echo \" \"\n\n");

    s.push_str("# set job environment\n");
    for line in &cluster.environment {
        let _ = writeln!(s, "{line}");
    }
    s.push_str("echo \" \"\n\n");

    let _ = writeln!(s, "echo \"{invocation}\"");
    let _ = writeln!(s, "{invocation}");
    s.push('\n');

    s.push_str("# echo job info on joblog\n");
    s.push_str("echo \"Job $JOB_ID ended on:   \" `hostname -s`\n");
    s.push_str("echo \"Job $JOB_ID ended on:   \" `date `\n");
    s.push_str("echo \" \"\n");
    s.push_str("echo \"Input file START:\"\n");
    let _ = writeln!(s, "cat {JOB_INPUT}");
    s.push_str("echo \"END of input file\"\n");
    s.push_str("echo \" \"\n");
    let _ = writeln!(s, "### {file_name} STOP ###");
    s.push('\n');
    s
}

/// Append-only list of queue-submission commands, one per conformer, in
/// generation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitManifest {
    lines: Vec<String>,
}

impl SubmitManifest {
    pub const HEADER: &'static str = "#!/bin/bash\n";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, submit_command: &str, molecule_dir: &str, conformer_name: &str) {
        self.lines
            .push(format!("{submit_command} {molecule_dir}/{conformer_name}.sh"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Manifest lines, newline-terminated, without the header.
    pub fn render_lines(&self) -> String {
        self.lines.iter().map(|line| format!("{line}\n")).collect()
    }

    /// A complete manifest document including the shebang.
    pub fn render(&self) -> String {
        format!("{}{}", Self::HEADER, self.render_lines())
    }
}
