use pixelphase::cli::{Settings, check_settings, get_raw_settings};
use pixelphase::data_types::match_pair::ComparisonPlan;
use pixelphase::phasing_config::PhasingConfig;
use pixelphase::raw_parsing::{GenotypeStore, IngestError};
use pixelphase::visual_phaser::{ChromosomeResult, PhasingError, solve_chromosome};
use pixelphase::writers::aligned_writer::AlignedTableWriter;
use pixelphase::writers::ordered_pixel_writer::OrderedPixelWriter;
use pixelphase::writers::segment_stats::SegmentStatsCollector;

use log::{LevelFilter, debug, error, info};
use std::fs::File;
use std::sync::{Arc, mpsc};
use std::time::Instant;
use threadpool::ThreadPool;

fn main() {
    // get the settings
    let settings: Settings = get_raw_settings();
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };

    // immediately setup logging first
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    // okay, now we can check all the other settings
    let cli_settings: Settings = check_settings(settings);

    // build the validated configuration every component shares
    let config: PhasingConfig = match cli_settings.phasing_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Error while parsing configuration: {}", e);
            std::process::exit(exitcode::USAGE);
        }
    };
    config.log_settings();

    // figure out who is getting compared
    let plan: ComparisonPlan = match ComparisonPlan::new(&cli_settings.individuals, cli_settings.extra_match.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while building comparison pairs: {}", e);
            std::process::exit(exitcode::USAGE);
        }
    };
    let pair_labels: Vec<String> = plan.pairs().iter()
        .map(|pair| plan.pair_label(pair))
        .collect();
    info!("Comparing {} pairs: {:?}", pair_labels.len(), pair_labels);

    // load every raw file once up front
    let genotype_store: GenotypeStore = match GenotypeStore::from_directory(&cli_settings.data_dir, plan.individuals()) {
        Ok(gs) => gs,
        Err(e) => {
            error!("Error during raw file loading: {}", e);
            let code: i32 = match e {
                IngestError::MissingInput { .. } => exitcode::NOINPUT,
                _ => exitcode::IOERR
            };
            std::process::exit(code);
        }
    };

    // this writer will write "in-order" provided we correctly pass the ordering of data to it
    let mut pixel_writer: OrderedPixelWriter<File> = match OrderedPixelWriter::new(&cli_settings.output_pixels_filename) {
        Ok(pw) => pw,
        Err(e) => {
            error!("Error during pixel writer creation: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };
    if let Some(ref filename) = cli_settings.aligned_filename {
        match AlignedTableWriter::new(filename, plan.individuals(), config.alignment.missing_value_sentinel()) {
            Ok(aw) => pixel_writer.set_aligned_writer(aw),
            Err(e) => {
                error!("Error during aligned table writer creation: {}", e);
                std::process::exit(exitcode::IOERR);
            }
        };
    }

    // create our segment stats collector
    let mut stats_collector: SegmentStatsCollector = SegmentStatsCollector::new();
    let mut failed_chromosomes: Vec<String> = vec![];

    let start_time: Instant = Instant::now();
    let chromosomes: Vec<String> = cli_settings.chromosomes.clone();
    info!("Visual phasing starting...");

    if cli_settings.threads <= 1 {
        for (chrom_index, chromosome) in chromosomes.iter().enumerate() {
            let result = solve_chromosome(chromosome, chrom_index, &genotype_store, &plan, &config);
            process_results(
                chrom_index, chromosome, result,
                &mut pixel_writer, &mut stats_collector, &mut failed_chromosomes
            );
        }
    } else {
        //set up job configuration
        info!("Starting job pool with {} threads...", cli_settings.threads);
        let pool = ThreadPool::new(cli_settings.threads);
        let (tx, rx) = mpsc::channel();
        let arc_genotype_store: Arc<GenotypeStore> = Arc::new(genotype_store);
        let arc_plan: Arc<ComparisonPlan> = Arc::new(plan.clone());
        let arc_config: Arc<PhasingConfig> = Arc::new(config.clone());

        let mut jobs_queued: u64 = 0;
        for (chrom_index, chromosome) in chromosomes.iter().enumerate() {
            let tx = tx.clone();
            let chromosome: String = chromosome.clone();
            let arc_genotype_store = arc_genotype_store.clone();
            let arc_plan = arc_plan.clone();
            let arc_config = arc_config.clone();

            pool.execute(move|| {
                let result = solve_chromosome(&chromosome, chrom_index, arc_genotype_store.as_ref(), &arc_plan, &arc_config);
                tx.send((chrom_index, chromosome, result)).expect("channel will be there waiting for the pool");
            });
            jobs_queued += 1;
        }
        debug!("Queued {} chromosome jobs", jobs_queued);

        // only the workers hold senders now, so recv() errors out if they all die
        drop(tx);

        let mut results_received: u64 = 0;
        while results_received < jobs_queued {
            // make sure no panics encountered so far
            if pool.panic_count() > 0 {
                error!("Panic detected in ThreadPool, check above for details.");
                std::process::exit(exitcode::SOFTWARE);
            }

            let (chrom_index, chromosome, result): (usize, String, Result<ChromosomeResult, PhasingError>) = match rx.recv() {
                Ok(r) => r,
                Err(e) => {
                    error!("Error while receiving chromosome results: {}", e);
                    std::process::exit(exitcode::SOFTWARE);
                }
            };
            results_received += 1;

            process_results(
                chrom_index, &chromosome, result,
                &mut pixel_writer, &mut stats_collector, &mut failed_chromosomes
            );
            info!("Received results for {} / {} chromosomes, writer waiting on chromosome index {}", results_received, jobs_queued, pixel_writer.get_wait_index());
        }
    }

    info!("All chromosomes analyzed, finalizing output files...");
    match pixel_writer.finalize() {
        Ok(()) => {
            info!("Wrote {} pixel rows to {:?}.", pixel_writer.rows_written(), cli_settings.output_pixels_filename);
        },
        Err(e) => {
            error!("Error while finalizing pixel track file: {}", e);
            std::process::exit(exitcode::IOERR);
        }
    };

    if let Some(ref filename) = cli_settings.segments_filename {
        // this will save all painted segments to a csv/tsv file
        info!("Saving all segments to {:?}...", filename);
        match stats_collector.write_segments(filename) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while writing segments file: {}", e);
                std::process::exit(exitcode::IOERR);
            }
        };
    }

    if let Some(ref filename) = cli_settings.summary_filename {
        // this will save pair level stats to a csv/tsv file
        info!("Saving summary pair statistics to {:?}...", filename);
        match stats_collector.write_summary(&pair_labels, filename) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while writing summary statistics file: {}", e);
                std::process::exit(exitcode::IOERR);
            }
        };
    }

    if !failed_chromosomes.is_empty() {
        error!("{} chromosome(s) failed and were skipped: {:?}", failed_chromosomes.len(), failed_chromosomes);
        std::process::exit(exitcode::DATAERR);
    }
    info!("All chromosomes finished successfully after {} seconds.", start_time.elapsed().as_secs_f64());
}

/// Sub-routine to make sure we are always consistently processing results in an identical manner
/// # Arguments
/// * `chrom_index` - the index of the chromosome in the run order
/// * `chromosome` - the chromosome name, for logging
/// * `result` - the outcome of `solve_chromosome(...)`
/// * `pixel_writer` - mutable reference to the ordered pixel writer
/// * `stats_collector` - mutable reference to the segment stats collector
/// * `failed_chromosomes` - collects the names of chromosomes that failed
fn process_results(
    chrom_index: usize, chromosome: &str, result: Result<ChromosomeResult, PhasingError>,
    pixel_writer: &mut OrderedPixelWriter<File>, stats_collector: &mut SegmentStatsCollector,
    failed_chromosomes: &mut Vec<String>
) {
    let write_result = match result {
        Ok(chrom_result) => {
            info!("Chromosome {}: {} aligned rows across {} pairs", chromosome, chrom_result.table.len(), chrom_result.pair_results.len());
            stats_collector.add_result(&chrom_result);
            pixel_writer.write_chromosome(chrom_result)
        },
        Err(e) => {
            // a failed chromosome is skipped, the rest of the run continues
            error!("Error while processing chromosome {}: {}", chromosome, e);
            failed_chromosomes.push(chromosome.to_string());
            pixel_writer.write_dummy_chromosome(chrom_index)
        }
    };

    match write_result {
        Ok(()) => {},
        Err(e) => {
            error!("Error while saving chromosome {}: {}", chromosome, e);
            std::process::exit(exitcode::IOERR);
        }
    };
}
