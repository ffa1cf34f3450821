//! Command rendering
//!
//! Pure translation from a validated [`WorkflowSpec`] to the shell command
//! dispatched inside `docker run` on the remote host. The High security
//! profile renders one uniform client invocation of the all-in-one image;
//! the Medium/Low profiles render a workflow-specific pipeline of external
//! tools as an explicit ordered stage list, joined with `&&` so any
//! stage's non-zero status aborts the remainder.

use crate::config::DockerConfig;
use crate::workflow::{
    absolutize, derive_base_name, strip_extension, RenderError, WorkflowKind, WorkflowSpec,
};

/// Shared scratch directory for pipeline outputs inside the toolchain image.
const RESULTS_DIR: &str = "/tmp/bio_fasta/results";

/// One gated step of a Low-profile pipeline.
#[derive(Debug, Clone)]
pub struct Stage {
    pub label: &'static str,
    pub command: String,
}

/// The rendered invocation plus its stage breakdown for reporting.
#[derive(Debug, Clone)]
pub struct RenderedCommand {
    command: String,
    stages: Vec<Stage>,
}

impl RenderedCommand {
    /// The full wire-form command handed to the remote session.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// Render the client invocation for `spec`. Never emits a
/// partially-substituted command: required parameters were checked at
/// spec construction and are re-checked here.
pub fn render(spec: &WorkflowSpec, docker: &DockerConfig) -> Result<RenderedCommand, RenderError> {
    if spec.profile().is_high() {
        render_high(spec, docker)
    } else {
        render_low(spec, docker)
    }
}

/// Quote a value for POSIX `sh`. Values made of clearly-inert characters
/// pass through untouched so routine commands stay byte-stable.
pub fn sh_quote(value: &str) -> String {
    let inert = |c: char| c.is_ascii_alphanumeric() || "_-./:=,".contains(c);
    if !value.is_empty() && value.chars().all(inert) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn render_high(spec: &WorkflowSpec, docker: &DockerConfig) -> Result<RenderedCommand, RenderError> {
    let params = spec.params();
    let mut command = format!(
        "docker run -it --rm --name {name} {image} client \
         --policy_host={policy} --server_app_host={server} --analysis_type={analysis}",
        name = docker.high_client_container,
        image = docker.run_image_for(spec.profile()),
        policy = sh_quote(&params.policy_host),
        server = sh_quote(&params.server_app_host),
        analysis = spec.kind().analysis_type(),
    );

    match spec.kind() {
        WorkflowKind::SequenceQuality => {
            let dataset = absolutize(spec.require("dataset_file")?);
            let flag = spec.require("parameters")?;
            command.push_str(&format!(
                " --dataset_file={} --parameters=--{} --threads={}",
                sh_quote(&dataset),
                sh_quote(flag),
                params.threads,
            ));
        }
        WorkflowKind::ReadAlignment => {
            let reference = absolutize(spec.require("reference_genome")?);
            let paired_1 = absolutize(spec.require("paired_file_1")?);
            let paired_2 = absolutize(spec.require("paired_file_2")?);
            command.push_str(&format!(
                " --reference_genome={} --paired_file_1={} --paired_file_2={}",
                sh_quote(&reference),
                sh_quote(&paired_1),
                sh_quote(&paired_2),
            ));
        }
        WorkflowKind::IndelCalling | WorkflowKind::SnpCalling => {
            let reference = absolutize(spec.require("reference_genome")?);
            let dataset = absolutize(spec.require("dataset_file")?);
            command.push_str(&format!(
                " --reference_genome={} --dataset_file={}",
                sh_quote(&reference),
                sh_quote(&dataset),
            ));
        }
    }

    Ok(RenderedCommand {
        stages: vec![Stage {
            label: "client",
            command: command.clone(),
        }],
        command,
    })
}

fn render_low(spec: &WorkflowSpec, docker: &DockerConfig) -> Result<RenderedCommand, RenderError> {
    let stages = match spec.kind() {
        WorkflowKind::SequenceQuality => sequence_quality_stages(spec)?,
        WorkflowKind::ReadAlignment => read_alignment_stages(spec)?,
        WorkflowKind::IndelCalling | WorkflowKind::SnpCalling => variant_calling_stages(spec)?,
    };

    let body = stages
        .iter()
        .map(|s| s.command.as_str())
        .collect::<Vec<_>>()
        .join(" && ");
    let command = format!(
        "docker run --rm --name {name} {image} sh -c {body}",
        name = docker.client_container_for(spec.profile()),
        image = docker.run_image_for(spec.profile()),
        body = sh_quote(&body),
    );

    Ok(RenderedCommand { command, stages })
}

fn sequence_quality_stages(spec: &WorkflowSpec) -> Result<Vec<Stage>, RenderError> {
    let dataset = absolutize(spec.require("dataset_file")?);
    let flag = spec.require("parameters")?;
    let base = derive_base_name(&dataset);

    Ok(vec![
        Stage {
            label: "prepare-results",
            command: format!("mkdir -p {RESULTS_DIR}/"),
        },
        Stage {
            label: "seed-report",
            command: format!("touch {RESULTS_DIR}/{base}_fastqc.html"),
        },
        Stage {
            label: "quality-check",
            command: format!(
                "fastqc {} --threads {} --{} -o {RESULTS_DIR}/ 2>&1",
                sh_quote(&dataset),
                spec.params().threads,
                sh_quote(flag),
            ),
        },
    ])
}

fn read_alignment_stages(spec: &WorkflowSpec) -> Result<Vec<Stage>, RenderError> {
    let reference = absolutize(spec.require("reference_genome")?);
    let paired_1 = absolutize(spec.require("paired_file_1")?);
    let paired_2 = absolutize(spec.require("paired_file_2")?);
    let base = derive_base_name(&reference);
    let threads = spec.params().threads;

    let sam = format!("{RESULTS_DIR}/{base}.sam");
    let sorted_bam = format!("{RESULTS_DIR}/{base}.sorted.bam");
    let tagged_bam = format!("{RESULTS_DIR}/{base}.rg.bam");

    Ok(vec![
        Stage {
            label: "prepare-results",
            command: format!("mkdir -p {RESULTS_DIR}/"),
        },
        Stage {
            label: "seed-alignment",
            command: format!("touch {sam}"),
        },
        Stage {
            label: "index-reference",
            command: format!("bwa index {}", sh_quote(&reference)),
        },
        Stage {
            label: "align",
            command: format!(
                "bwa mem -t {threads} {} {} {} > {sam}",
                sh_quote(&reference),
                sh_quote(&paired_1),
                sh_quote(&paired_2),
            ),
        },
        Stage {
            label: "convert-sort",
            command: format!("samtools view -bS {sam} | samtools sort -o {sorted_bam}"),
        },
        Stage {
            label: "index-alignment",
            command: format!("samtools index {sorted_bam}"),
        },
        Stage {
            label: "tag-read-groups",
            command: format!(
                "picard AddOrReplaceReadGroups I={sorted_bam} O={tagged_bam} \
                 RGID=dummyID RGLB=dummyLibrary RGPL=illumina \
                 RGPU=dummyPlatformUnit RGSM=dummySample"
            ),
        },
        Stage {
            label: "index-tagged",
            command: format!("samtools index {tagged_bam} 2>&1"),
        },
    ])
}

fn variant_calling_stages(spec: &WorkflowSpec) -> Result<Vec<Stage>, RenderError> {
    let reference = absolutize(spec.require("reference_genome")?);
    let dataset = absolutize(spec.require("dataset_file")?);
    let base = derive_base_name(&dataset);
    let dict = format!("{}.dict", strip_extension(&reference));
    let heap_mb = spec.params().threads * 1024;

    let raw_vcf = format!("{RESULTS_DIR}/{base}_raw_variants.vcf");
    let (filtered_vcf, expression, filter_name) = match spec.kind() {
        WorkflowKind::SnpCalling => (
            format!("{RESULTS_DIR}/{base}_filtered_snps.vcf"),
            "QD < 2.0 || FS > 60.0 || MQ < 40.0",
            "SNP_filter",
        ),
        _ => (
            format!("{RESULTS_DIR}/{base}_filtered_indels.vcf"),
            "QD < 2.0 || FS > 200.0",
            "INDEL_filter",
        ),
    };

    Ok(vec![
        Stage {
            // gatk's wrapper expects a bare `python` on PATH
            label: "link-python",
            command: "ln -s /usr/bin/python3 /usr/bin/python".to_string(),
        },
        Stage {
            label: "prepare-results",
            command: format!("mkdir -p {RESULTS_DIR}/"),
        },
        Stage {
            label: "index-reference",
            command: format!("samtools faidx {}", sh_quote(&reference)),
        },
        Stage {
            label: "sequence-dictionary",
            command: format!(
                "gatk CreateSequenceDictionary -R {} -O {}",
                sh_quote(&reference),
                sh_quote(&dict),
            ),
        },
        Stage {
            label: "index-input",
            command: format!("samtools index {}", sh_quote(&dataset)),
        },
        Stage {
            label: "call-variants",
            command: format!(
                "gatk --java-options \"-Xmx{heap_mb}M\" HaplotypeCaller -R {} -I {} -O {raw_vcf}",
                sh_quote(&reference),
                sh_quote(&dataset),
            ),
        },
        Stage {
            label: "filter-variants",
            command: format!(
                "gatk VariantFiltration -R {} -V {raw_vcf} -O {filtered_vcf} \
                 --filter-expression \"{expression}\" --filter-name {filter_name} 2>&1",
                sh_quote(&reference),
            ),
        },
    ])
}
